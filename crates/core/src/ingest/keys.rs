use std::fmt::Display;

use crate::domain::confirmation::{
    MoConfirmation, PickConfirmation, PickKind, RmaConfirmation, RmaKind,
};

/// Separator between rendered key fields.
pub const KEY_SEPARATOR: &str = "-";

/// Every duplicate rule the engine knows about. Each variant owns its table and
/// the ordered column list; the same list renders the in-batch key and drives
/// the persisted count query, so the two can never drift apart.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyVariant {
    MoConfirmation,
    OutboundPick,
    PickRmaDelivery,
    RmaDelivery,
    RmaReceipt,
}

impl KeyVariant {
    pub fn table(self) -> &'static str {
        match self {
            Self::MoConfirmation => "mo_confirmation",
            Self::OutboundPick | Self::PickRmaDelivery => "pick_confirmation",
            Self::RmaDelivery | Self::RmaReceipt => "rma_confirmation",
        }
    }

    pub fn columns(self) -> &'static [&'static str] {
        match self {
            Self::MoConfirmation => &[
                "source_location_id",
                "delivery_detail_id",
                "item_id",
                "mo_number",
                "mo_line_number",
                "status",
            ],
            Self::OutboundPick => &[
                "delivery_detail_id",
                "from_serial_number",
                "attribute1",
                "attribute2",
                "attribute3",
                "attribute4",
            ],
            Self::PickRmaDelivery => {
                &["from_serial_number", "attribute2", "attribute3", "transaction_type"]
            }
            Self::RmaDelivery => &[
                "transaction_type",
                "receipt_number",
                "line_number",
                "order_header_id",
                "order_line_id",
                "attribute3",
                "attribute10",
                "item_id",
                "status",
            ],
            Self::RmaReceipt => &[
                "transaction_type",
                "line_number",
                "order_header_id",
                "order_line_id",
                "attribute3",
                "item_id",
                "status",
            ],
        }
    }
}

/// Ordered field values for one record under one [`KeyVariant`]. Values are
/// held in their rendered text form; a missing value is `None` and renders as
/// the empty string.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompositeKey {
    variant: KeyVariant,
    values: Vec<Option<String>>,
}

impl CompositeKey {
    fn new(variant: KeyVariant, values: Vec<Option<String>>) -> Self {
        debug_assert_eq!(values.len(), variant.columns().len());
        Self { variant, values }
    }

    pub fn variant(&self) -> KeyVariant {
        self.variant
    }

    /// `(column, rendered value)` pairs in key order.
    pub fn fields(&self) -> impl Iterator<Item = (&'static str, &str)> + '_ {
        self.variant
            .columns()
            .iter()
            .copied()
            .zip(self.values.iter().map(|value| value.as_deref().unwrap_or("")))
    }

    pub fn render(&self) -> String {
        self.values
            .iter()
            .map(|value| value.as_deref().unwrap_or(""))
            .collect::<Vec<_>>()
            .join(KEY_SEPARATOR)
    }
}

impl Display for CompositeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render())
    }
}

fn text(value: &Option<String>) -> Option<String> {
    value.clone()
}

fn num(value: Option<i64>) -> Option<String> {
    value.map(|value| value.to_string())
}

pub fn mo_key(record: &MoConfirmation) -> CompositeKey {
    CompositeKey::new(
        KeyVariant::MoConfirmation,
        vec![
            num(record.source_location_id),
            num(record.delivery_detail_id),
            num(record.item_id),
            num(record.mo_number),
            num(record.mo_line_number),
            text(&record.status),
        ],
    )
}

/// `None` when the pick line carries a transaction type with no duplicate rule.
pub fn pick_key(record: &PickConfirmation) -> Option<CompositeKey> {
    let variant = match PickKind::classify(record.transaction_type.as_deref())? {
        PickKind::OutboundPicking => KeyVariant::OutboundPick,
        PickKind::RmaDelivery => KeyVariant::PickRmaDelivery,
    };
    pick_key_as(variant, record)
}

/// Reads a pick line through an explicit rule, whatever its own type says.
pub fn pick_key_as(variant: KeyVariant, record: &PickConfirmation) -> Option<CompositeKey> {
    let attrs = &record.attributes;
    let values = match variant {
        KeyVariant::OutboundPick => vec![
            num(record.delivery_detail_id),
            text(&record.from_serial_number),
            text(&attrs.attribute1),
            text(&attrs.attribute2),
            text(&attrs.attribute3),
            text(&attrs.attribute4),
        ],
        KeyVariant::PickRmaDelivery => vec![
            text(&record.from_serial_number),
            text(&attrs.attribute2),
            text(&attrs.attribute3),
            text(&record.transaction_type),
        ],
        _ => return None,
    };
    Some(CompositeKey::new(variant, values))
}

pub fn rma_key(record: &RmaConfirmation) -> Option<CompositeKey> {
    let variant = match RmaKind::classify(record.transaction_type.as_deref())? {
        RmaKind::Delivery => KeyVariant::RmaDelivery,
        RmaKind::Receipt => KeyVariant::RmaReceipt,
    };
    rma_key_as(variant, record)
}

pub fn rma_key_as(variant: KeyVariant, record: &RmaConfirmation) -> Option<CompositeKey> {
    let attrs = &record.attributes;
    let values = match variant {
        KeyVariant::RmaDelivery => vec![
            text(&record.transaction_type),
            text(&record.receipt_number),
            num(record.line_number),
            num(record.order_header_id),
            num(record.order_line_id),
            text(&attrs.attribute3),
            text(&attrs.attribute10),
            num(record.item_id),
            text(&record.status),
        ],
        KeyVariant::RmaReceipt => vec![
            text(&record.transaction_type),
            num(record.line_number),
            num(record.order_header_id),
            num(record.order_line_id),
            text(&attrs.attribute3),
            num(record.item_id),
            text(&record.status),
        ],
        _ => return None,
    };
    Some(CompositeKey::new(variant, values))
}
