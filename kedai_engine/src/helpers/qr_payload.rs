//! QR transfer payloads.
//!
//! The payload follows the EMV merchant-presented QR layout: a flat sequence of tag-length-value fields, where the tag
//! is two digits, the length is two digits, and the value is at most 99 characters. The final field is a CRC-16
//! checksum over everything before it (including the checksum's own tag and length).
//!
//! These codes are synthesised locally from order data. Nothing here talks to a payment processor.
use std::fmt::Display;

use kedai_common::{Rupiah, IDR_NUMERIC_CODE};
use qrcode::{render::svg, QrCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db_types::PaymentId;

const PAYLOAD_FORMAT_INDICATOR: &str = "00";
const POINT_OF_INITIATION: &str = "01";
const MERCHANT_CATEGORY: &str = "52";
const TRANSACTION_CURRENCY: &str = "53";
const TRANSACTION_AMOUNT: &str = "54";
const COUNTRY_CODE: &str = "58";
const MERCHANT_NAME: &str = "59";
const MERCHANT_CITY: &str = "60";
const ADDITIONAL_DATA: &str = "62";
const BILL_NUMBER: &str = "01";
const CRC: &str = "63";

/// Dynamic QR, i.e. valid for a single transaction
const DYNAMIC_INITIATION: &str = "12";
const FORMAT_VERSION: &str = "01";
const MAX_NAME_LEN: usize = 25;
const MAX_CITY_LEN: usize = 15;
const MAX_REFERENCE_LEN: usize = 25;
const MAX_VALUE_LEN: usize = 99;

#[derive(Debug, Clone, Error)]
pub enum QrPayloadError {
    #[error("QR field {tag} is too long ({len} characters)")]
    FieldTooLong { tag: &'static str, len: usize },
    #[error("QR field {0} must not be empty")]
    EmptyField(&'static str),
    #[error("QR payment amount must be positive, but was {0}")]
    InvalidAmount(Rupiah),
    #[error("Could not render QR code. {0}")]
    RenderError(String),
}

/// The merchant details embedded in every payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerchantProfile {
    pub name: String,
    pub city: String,
    /// ISO 18245 merchant category code. 5812 is "eating places and restaurants".
    pub category_code: String,
    /// ISO 3166 alpha-2
    pub country_code: String,
}

impl Default for MerchantProfile {
    fn default() -> Self {
        Self {
            name: "Kedai".to_string(),
            city: "Jakarta".to_string(),
            category_code: "5812".to_string(),
            country_code: "ID".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QrPayload(String);

impl QrPayload {
    /// Builds the payload for a single payment.
    pub fn build(merchant: &MerchantProfile, payment_id: &PaymentId, amount: Rupiah) -> Result<Self, QrPayloadError> {
        if !amount.is_positive() {
            return Err(QrPayloadError::InvalidAmount(amount));
        }
        let name = truncate(merchant.name.trim(), MAX_NAME_LEN);
        let city = truncate(merchant.city.trim(), MAX_CITY_LEN);
        let reference = truncate(payment_id.as_str(), MAX_REFERENCE_LEN);
        let additional_data = tlv(BILL_NUMBER, &reference)?;

        let mut payload = String::with_capacity(160);
        payload.push_str(&tlv(PAYLOAD_FORMAT_INDICATOR, FORMAT_VERSION)?);
        payload.push_str(&tlv(POINT_OF_INITIATION, DYNAMIC_INITIATION)?);
        payload.push_str(&tlv(MERCHANT_CATEGORY, &merchant.category_code)?);
        payload.push_str(&tlv(TRANSACTION_CURRENCY, IDR_NUMERIC_CODE)?);
        payload.push_str(&tlv(TRANSACTION_AMOUNT, &amount.value().to_string())?);
        payload.push_str(&tlv(COUNTRY_CODE, &merchant.country_code)?);
        payload.push_str(&tlv(MERCHANT_NAME, &name)?);
        payload.push_str(&tlv(MERCHANT_CITY, &city)?);
        payload.push_str(&tlv(ADDITIONAL_DATA, &additional_data)?);
        payload.push_str(CRC);
        payload.push_str("04");
        let crc = crc16_ccitt(payload.as_bytes());
        payload.push_str(&format!("{crc:04X}"));
        Ok(Self(payload))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Renders the payload as a scannable SVG image.
    pub fn to_svg(&self) -> Result<String, QrPayloadError> {
        render_qr_svg(&self.0)
    }
}

impl Display for QrPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn render_qr_svg(data: &str) -> Result<String, QrPayloadError> {
    let code = QrCode::new(data.as_bytes()).map_err(|e| QrPayloadError::RenderError(e.to_string()))?;
    let image = code
        .render::<svg::Color<'_>>()
        .min_dimensions(240, 240)
        .dark_color(svg::Color("#000000"))
        .light_color(svg::Color("#ffffff"))
        .build();
    Ok(image)
}

fn tlv(tag: &'static str, value: &str) -> Result<String, QrPayloadError> {
    let len = value.chars().count();
    if len == 0 {
        return Err(QrPayloadError::EmptyField(tag));
    }
    if len > MAX_VALUE_LEN {
        return Err(QrPayloadError::FieldTooLong { tag, len });
    }
    Ok(format!("{tag}{len:02}{value}"))
}

fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// CRC-16/CCITT-FALSE (polynomial 0x1021, initial value 0xFFFF, no reflection), as required by the EMV QR spec.
pub fn crc16_ccitt(data: &[u8]) -> u16 {
    let mut crc: u16 = 0xFFFF;
    for &byte in data {
        crc ^= u16::from(byte) << 8;
        for _ in 0..8 {
            crc = if crc & 0x8000 != 0 { (crc << 1) ^ 0x1021 } else { crc << 1 };
        }
    }
    crc
}

#[cfg(test)]
mod test {
    use super::*;

    fn parse(payload: &str) -> Vec<(String, String)> {
        let mut fields = Vec::new();
        let mut rest = payload;
        while !rest.is_empty() {
            let tag = rest[0..2].to_string();
            let len = rest[2..4].parse::<usize>().unwrap();
            fields.push((tag, rest[4..4 + len].to_string()));
            rest = &rest[4 + len..];
        }
        fields
    }

    fn field<'a>(fields: &'a [(String, String)], tag: &str) -> &'a str {
        fields.iter().find(|(t, _)| t == tag).map(|(_, v)| v.as_str()).unwrap()
    }

    #[test]
    fn crc_check_value() {
        assert_eq!(crc16_ccitt(b"123456789"), 0x29B1);
    }

    #[test]
    fn payload_fields() {
        let merchant = MerchantProfile::default();
        let id = PaymentId::from("QRIS-1739876543210-K3Q9ZD");
        let payload = QrPayload::build(&merchant, &id, Rupiah::from(38_000)).unwrap();
        let fields = parse(payload.as_str());
        let tags = fields.iter().map(|(t, _)| t.as_str()).collect::<Vec<_>>();
        assert_eq!(tags, vec!["00", "01", "52", "53", "54", "58", "59", "60", "62", "63"]);
        assert_eq!(field(&fields, "00"), "01");
        assert_eq!(field(&fields, "01"), "12");
        assert_eq!(field(&fields, "53"), "360");
        assert_eq!(field(&fields, "54"), "38000");
        assert_eq!(field(&fields, "58"), "ID");
        assert_eq!(field(&fields, "59"), "Kedai");
        assert_eq!(field(&fields, "62"), "0125QRIS-1739876543210-K3Q9ZD");
    }

    #[test]
    fn checksum_covers_the_payload() {
        let id = PaymentId::from("QRIS-1-ABCDEF");
        let payload = QrPayload::build(&MerchantProfile::default(), &id, Rupiah::from(8_000)).unwrap();
        let s = payload.as_str();
        let (body, crc) = s.split_at(s.len() - 4);
        assert!(body.ends_with("6304"));
        assert_eq!(crc, format!("{:04X}", crc16_ccitt(body.as_bytes())));
    }

    #[test]
    fn long_values_are_truncated() {
        let merchant = MerchantProfile {
            name: "Kedai Kopi dan Nasi Goreng Pak Slamet Sejahtera".into(),
            city: "Kota Administrasi Jakarta Selatan".into(),
            ..Default::default()
        };
        let id = PaymentId::from("QRIS-1739876543210-K3Q9ZD-EXTRA-LONG-SUFFIX");
        let payload = QrPayload::build(&merchant, &id, Rupiah::from(1)).unwrap();
        let fields = parse(payload.as_str());
        assert_eq!(field(&fields, "59").len(), 25);
        assert_eq!(field(&fields, "60").len(), 15);
        assert_eq!(field(&fields, "62"), "0125QRIS-1739876543210-K3Q9ZD");
    }

    #[test]
    fn building_is_deterministic() {
        let id = PaymentId::from("QRIS-1-ABCDEF");
        let a = QrPayload::build(&MerchantProfile::default(), &id, Rupiah::from(8_000)).unwrap();
        let b = QrPayload::build(&MerchantProfile::default(), &id, Rupiah::from(8_000)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn rejects_bad_input() {
        let id = PaymentId::from("QRIS-1-ABCDEF");
        let merchant = MerchantProfile::default();
        assert!(matches!(QrPayload::build(&merchant, &id, Rupiah::from(0)), Err(QrPayloadError::InvalidAmount(_))));
        let nameless = MerchantProfile { name: "  ".into(), ..Default::default() };
        assert!(matches!(QrPayload::build(&nameless, &id, Rupiah::from(10)), Err(QrPayloadError::EmptyField("59"))));
    }

    #[test]
    fn renders_svg() {
        let id = PaymentId::from("QRIS-1-ABCDEF");
        let payload = QrPayload::build(&MerchantProfile::default(), &id, Rupiah::from(8_000)).unwrap();
        let svg = payload.to_svg().unwrap();
        assert!(svg.contains("<svg"));
    }
}
