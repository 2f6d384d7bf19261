pub mod dispatch;
pub mod invoice;
pub mod mailer;

pub use dispatch::{send_booking_confirmation, send_contact_notification, ContactNotification};
pub use invoice::render_invoice_pdf;
pub use mailer::{ConsoleMailer, Mailer, OutboundEmail, RecordingMailer, SmtpMailer};
