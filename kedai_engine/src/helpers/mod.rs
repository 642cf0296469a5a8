//! Pure helper functions used by the order and payment flows. Nothing in here touches the database.
mod payment_id;
mod qr_payload;
mod queue_id;

pub use payment_id::new_payment_id;
pub use qr_payload::{crc16_ccitt, render_qr_svg, MerchantProfile, QrPayload, QrPayloadError};
pub use queue_id::{new_queue_id, queue_id_from_parts};
