//! Builds and sends the two outbound notifications. Transport and render
//! failures are logged and swallowed: a committed booking or stored contact
//! submission never fails because mail could not go out.

use skyfare_core::format_amount;
use skyfare_core::invoice::InvoiceContext;

use crate::invoice::render_invoice_pdf;
use crate::mailer::{EmailAttachment, Mailer, OutboundEmail};

fn format_time(t: chrono::DateTime<chrono::Utc>) -> String {
    t.format("%Y-%m-%d %H:%M UTC").to_string()
}

fn confirmation_text(ctx: &InvoiceContext) -> String {
    let total = ctx
        .total_cents
        .map(|t| format_amount(t, &ctx.currency))
        .unwrap_or_default();
    format!(
        "Booking Confirmed — #{id}\n\
         Passenger: {name} ({email})\n\
         Flight: {number} — {origin} -> {destination}\n\
         Departure: {departure} | Arrival: {arrival}\n\
         Seats: {seats}\n\
         Total: {total}\n\
         Your invoice (PDF) is attached.\n\
         Support: {support_email} | {support_phone}\n",
        id = ctx.booking_id,
        name = ctx.passenger_name,
        email = ctx.passenger_email,
        number = ctx.flight_number,
        origin = ctx.origin_code,
        destination = ctx.destination_code,
        departure = format_time(ctx.departure_time),
        arrival = format_time(ctx.arrival_time),
        seats = ctx.seats.unwrap_or(1),
        total = total,
        support_email = ctx.support_email,
        support_phone = ctx.support_phone,
    )
}

fn confirmation_html(ctx: &InvoiceContext) -> String {
    let total = ctx
        .total_cents
        .map(|t| format_amount(t, &ctx.currency))
        .unwrap_or_default();
    format!(
        "<h2>Booking Confirmed — #{id}</h2>\
         <p>Dear {name},</p>\
         <p>Your reservation on flight <strong>{number}</strong> \
         ({origin} → {destination}) is confirmed.</p>\
         <ul>\
         <li>Departure: {departure}</li>\
         <li>Arrival: {arrival}</li>\
         <li>Seats: {seats}</li>\
         <li>Total: <strong>{total}</strong></li>\
         </ul>\
         <p>Your invoice (PDF) is attached.</p>\
         <p>{company} — {support_email} | {support_phone}</p>",
        id = ctx.booking_id,
        name = ctx.passenger_name,
        number = ctx.flight_number,
        origin = ctx.origin_code,
        destination = ctx.destination_code,
        departure = format_time(ctx.departure_time),
        arrival = format_time(ctx.arrival_time),
        seats = ctx.seats.unwrap_or(1),
        total = total,
        company = ctx.company_name,
        support_email = ctx.support_email,
        support_phone = ctx.support_phone,
    )
}

/// Send the booking confirmation (HTML + text, invoice PDF attached) to the
/// passenger. Never fails the caller.
pub async fn send_booking_confirmation(mailer: &dyn Mailer, ctx: &InvoiceContext) {
    let pdf = match render_invoice_pdf(ctx) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!(booking_id = %ctx.booking_id, error = %e, "invoice rendering failed");
            return;
        }
    };

    let email = OutboundEmail {
        to: ctx.passenger_email.clone(),
        subject: format!("Booking Confirmation — #{}", ctx.booking_id),
        text_body: confirmation_text(ctx),
        html_body: Some(confirmation_html(ctx)),
        attachment: Some(EmailAttachment {
            filename: format!("Invoice_{}.pdf", ctx.booking_id),
            content_type: "application/pdf".to_string(),
            bytes: pdf,
        }),
    };

    if let Err(e) = mailer.send(email).await {
        tracing::error!(
            booking_id = %ctx.booking_id,
            error = %e,
            "failed to send booking confirmation"
        );
    }
}

#[derive(Debug, Clone)]
pub struct ContactNotification {
    pub sender_name: String,
    pub sender_email: String,
    pub subject: String,
    pub message: String,
}

/// Forward a contact submission to the support mailbox as plain text. Never
/// fails the caller.
pub async fn send_contact_notification(
    mailer: &dyn Mailer,
    support_email: &str,
    notification: &ContactNotification,
) {
    let body = format!(
        "New contact submission\n\n\
         From: {name} <{email}>\n\
         Subject: {subject}\n\n\
         Message:\n{message}\n",
        name = notification.sender_name,
        email = notification.sender_email,
        subject = notification.subject,
        message = notification.message,
    );

    let email = OutboundEmail {
        to: support_email.to_string(),
        subject: format!("[Contact] {}", notification.subject),
        text_body: body,
        html_body: None,
        attachment: None,
    };

    if let Err(e) = mailer.send(email).await {
        tracing::error!(
            sender = %notification.sender_email,
            error = %e,
            "failed to send contact notification"
        );
    }
}
