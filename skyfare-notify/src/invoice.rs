//! Single-page A4 invoice with a fixed layout: header, passenger block,
//! flight block, billing block, footer. Vertical offsets are fixed; content
//! overflow is not handled.

use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfLayerReference};

use skyfare_core::format_amount;
use skyfare_core::invoice::InvoiceContext;

#[derive(Debug, thiserror::Error)]
pub enum InvoiceError {
    #[error("pdf generation failed: {0}")]
    Pdf(String),
}

const LEFT: f32 = 20.0;
const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;

struct Cursor<'a> {
    layer: &'a PdfLayerReference,
    regular: &'a IndirectFontRef,
    bold: &'a IndirectFontRef,
    y: f32,
}

impl Cursor<'_> {
    fn line(&mut self, text: &str, size: f32, bold: bool, advance: f32) {
        let font = if bold { self.bold } else { self.regular };
        self.layer.use_text(text, size, Mm(LEFT), Mm(self.y), font);
        self.y -= advance;
    }
}

fn format_time(t: chrono::DateTime<chrono::Utc>) -> String {
    t.format("%Y-%m-%d %H:%M UTC").to_string()
}

/// Render the invoice document for a booking. Pure: same context, same
/// layout.
pub fn render_invoice_pdf(ctx: &InvoiceContext) -> Result<Vec<u8>, InvoiceError> {
    let (doc, page, layer) = PdfDocument::new(
        format!("Invoice {}", ctx.booking_id),
        Mm(PAGE_WIDTH),
        Mm(PAGE_HEIGHT),
        "Layer 1",
    );
    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| InvoiceError::Pdf(e.to_string()))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| InvoiceError::Pdf(e.to_string()))?;
    let layer = doc.get_page(page).get_layer(layer);

    let mut cursor = Cursor {
        layer: &layer,
        regular: &regular,
        bold: &bold,
        y: PAGE_HEIGHT - 25.0,
    };

    // Header
    cursor.line(
        &format!("{} — Invoice", ctx.company_name),
        14.0,
        true,
        10.0,
    );
    cursor.line(&format!("Invoice #: {}", ctx.booking_id), 10.0, false, 6.0);
    cursor.line(
        &format!(
            "Passenger: {} ({})",
            ctx.passenger_name, ctx.passenger_email
        ),
        10.0,
        false,
        10.0,
    );

    // Flight
    cursor.line("Flight Details", 12.0, true, 7.0);
    cursor.line(&format!("Flight: {}", ctx.flight_number), 10.0, false, 6.0);
    cursor.line(
        &format!("{} → {}", ctx.origin_code, ctx.destination_code),
        10.0,
        false,
        6.0,
    );
    cursor.line(
        &format!("Departure: {}", format_time(ctx.departure_time)),
        10.0,
        false,
        6.0,
    );
    cursor.line(
        &format!("Arrival: {}", format_time(ctx.arrival_time)),
        10.0,
        false,
        10.0,
    );

    // Billing: lines with absent values are omitted.
    cursor.line("Billing", 12.0, true, 7.0);
    if let Some(unit_price) = ctx.unit_price_cents {
        cursor.line(
            &format!("Unit price: {}", format_amount(unit_price, &ctx.currency)),
            10.0,
            false,
            6.0,
        );
    }
    if let Some(seats) = ctx.seats {
        cursor.line(&format!("Seats: {seats}"), 10.0, false, 6.0);
    }
    if let Some(total) = ctx.total_cents {
        cursor.line(
            &format!("Total: {}", format_amount(total, &ctx.currency)),
            10.0,
            true,
            10.0,
        );
    }

    // Footer
    layer.use_text(
        format!(
            "{} · {} · {}",
            ctx.company_name, ctx.company_address, ctx.support_email
        ),
        9.0,
        Mm(LEFT),
        Mm(20.0),
        &regular,
    );

    doc.save_to_bytes().map_err(|e| InvoiceError::Pdf(e.to_string()))
}
