use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Numbered descriptive-flexfield slots carried by every confirmation family.
///
/// The slots stay in their legacy shape on the wire and in storage. Engine code
/// reads them through the named accessors on each record type instead of
/// indexing slots directly.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attributes {
    pub attribute_category: Option<String>,
    pub attribute1: Option<String>,
    pub attribute2: Option<String>,
    pub attribute3: Option<String>,
    pub attribute4: Option<String>,
    pub attribute5: Option<String>,
    pub attribute6: Option<String>,
    pub attribute7: Option<String>,
    pub attribute8: Option<String>,
    pub attribute9: Option<String>,
    pub attribute10: Option<String>,
    pub attribute11: Option<String>,
    pub attribute12: Option<String>,
    pub attribute13: Option<String>,
    pub attribute14: Option<String>,
    pub attribute15: Option<String>,
}

impl Attributes {
    /// Slot lookup by number, `1..=15`. Out of range yields `None`.
    pub fn slot(&self, index: u8) -> Option<&str> {
        let value = match index {
            1 => &self.attribute1,
            2 => &self.attribute2,
            3 => &self.attribute3,
            4 => &self.attribute4,
            5 => &self.attribute5,
            6 => &self.attribute6,
            7 => &self.attribute7,
            8 => &self.attribute8,
            9 => &self.attribute9,
            10 => &self.attribute10,
            11 => &self.attribute11,
            12 => &self.attribute12,
            13 => &self.attribute13,
            14 => &self.attribute14,
            15 => &self.attribute15,
            _ => return None,
        };
        value.as_deref()
    }

    pub fn slots(&self) -> [Option<&str>; 15] {
        [
            self.attribute1.as_deref(),
            self.attribute2.as_deref(),
            self.attribute3.as_deref(),
            self.attribute4.as_deref(),
            self.attribute5.as_deref(),
            self.attribute6.as_deref(),
            self.attribute7.as_deref(),
            self.attribute8.as_deref(),
            self.attribute9.as_deref(),
            self.attribute10.as_deref(),
            self.attribute11.as_deref(),
            self.attribute12.as_deref(),
            self.attribute13.as_deref(),
            self.attribute14.as_deref(),
            self.attribute15.as_deref(),
        ]
    }

    fn reconcile_flag(&self) -> bool {
        self.attribute12.as_deref().is_some_and(|flag| flag.eq_ignore_ascii_case("y"))
    }
}

/// Who/when columns maintained by the mobile client.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordAudit {
    pub last_update_date: Option<DateTime<Utc>>,
    pub last_updated_by: Option<i64>,
    pub creation_date: Option<DateTime<Utc>>,
    pub created_by: Option<i64>,
    pub last_update_login: Option<i64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoConfirmation {
    pub moid: Option<i64>,
    pub transaction_type: Option<String>,
    pub mo_number: Option<i64>,
    pub mo_line_number: Option<i64>,
    pub pick_slip_number: Option<i64>,
    pub item_id: Option<i64>,
    pub uom_code: Option<String>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub required_quantity: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub picked_quantity: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub transfer_quantity: Option<Decimal>,
    pub source_sub_inventory: Option<String>,
    pub destination_sub_inventory: Option<String>,
    pub source_location_id: Option<i64>,
    pub destination_location_id: Option<i64>,
    pub person_id: Option<i64>,
    pub status: Option<String>,
    pub error_message: Option<String>,
    #[serde(flatten)]
    pub attributes: Attributes,
    #[serde(flatten)]
    pub audit: RecordAudit,
    pub org_id: Option<i64>,
    pub org_code: Option<String>,
    pub item_code: Option<String>,
    pub order_number: Option<i64>,
    pub delivery_detail_id: Option<i64>,
    pub customer_name: Option<String>,
    pub customer_account_id: Option<i64>,
}

impl MoConfirmation {
    /// Lines flagged for pick reconciliation (`attribute12 = y`).
    pub fn reconcile_flagged(&self) -> bool {
        self.attributes.reconcile_flag()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PickConfirmation {
    pub serial_id: Option<i64>,
    pub delivery_detail_id: Option<i64>,
    pub from_serial_number: Option<String>,
    #[serde(rename = "toserialNumber")]
    pub to_serial_number: Option<String>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub quantity: Option<Decimal>,
    pub status: Option<String>,
    pub transaction_type: Option<String>,
    #[serde(flatten)]
    pub attributes: Attributes,
    #[serde(flatten)]
    pub audit: RecordAudit,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RmaConfirmation {
    pub rma_id: Option<i64>,
    pub transaction_type: Option<String>,
    pub party_id: Option<i64>,
    pub cust_account_id: Option<i64>,
    pub bill_to_sites_use_id: Option<i64>,
    pub ship_to_sites_use_id: Option<i64>,
    pub inventory_org_id: Option<i64>,
    pub line_number: Option<i64>,
    pub item_id: Option<i64>,
    pub uom_code: Option<String>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub order_quantity: Option<Decimal>,
    pub receipt_number: Option<String>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub return_quantity: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub delivered_quantity: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub received_quantity: Option<Decimal>,
    pub item_condition: Option<String>,
    pub suggested_subinventory: Option<String>,
    pub delivered_subinventory: Option<String>,
    pub suggested_locator_id: Option<i64>,
    pub delivered_locator_id: Option<i64>,
    pub person_id: Option<i64>,
    pub status: Option<String>,
    pub error_message: Option<String>,
    #[serde(flatten)]
    pub attributes: Attributes,
    #[serde(flatten)]
    pub audit: RecordAudit,
    pub org_id: Option<i64>,
    pub org_code: Option<String>,
    pub order_header_id: Option<i64>,
    #[serde(rename = "orderlineId")]
    pub order_line_id: Option<i64>,
    pub parent_transaction_id: Option<i64>,
    pub primary_unit_of_measurement: Option<String>,
}

impl RmaConfirmation {
    /// Locator code the handheld scanned at delivery time (`attribute10`).
    pub fn delivered_locator(&self) -> Option<&str> {
        self.attributes.attribute10.as_deref()
    }

    pub fn reconcile_flagged(&self) -> bool {
        self.attributes.reconcile_flag()
    }
}

/// Transaction families a pick line can belong to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PickKind {
    OutboundPicking,
    RmaDelivery,
}

impl PickKind {
    pub fn classify(transaction_type: Option<&str>) -> Option<Self> {
        let value = transaction_type?.trim();
        if value.eq_ignore_ascii_case("out bound picking") {
            Some(Self::OutboundPicking)
        } else if value.eq_ignore_ascii_case("rma_delivery") {
            Some(Self::RmaDelivery)
        } else {
            None
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RmaKind {
    Delivery,
    Receipt,
}

impl RmaKind {
    pub fn classify(transaction_type: Option<&str>) -> Option<Self> {
        let value = transaction_type?.trim();
        if value.eq_ignore_ascii_case("rma_delivery") {
            Some(Self::Delivery)
        } else if value.eq_ignore_ascii_case("rma_receipt") {
            Some(Self::Receipt)
        } else {
            None
        }
    }
}

/// Body of the combined MO + pick submission.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoPickSubmission {
    pub id: Option<i64>,
    #[serde(default)]
    pub mo_confirms: Vec<MoConfirmation>,
    #[serde(default)]
    pub pick_confirmations: Vec<PickConfirmation>,
}

/// Body of the combined RMA + pick submission.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RmaPickSubmission {
    #[serde(default)]
    pub rma_confirm: Vec<RmaConfirmation>,
    #[serde(default)]
    pub pick_confirm: Vec<PickConfirmation>,
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use serde_json::json;

    use super::{MoConfirmation, PickKind, RmaConfirmation, RmaKind, RmaPickSubmission};

    #[test]
    fn mo_confirmation_reads_legacy_field_names() {
        let record: MoConfirmation = serde_json::from_value(json!({
            "moNumber": 9001,
            "moLineNumber": 2,
            "deliveryDetailId": 77,
            "pickedQuantity": 5,
            "attribute12": "Y",
            "sourceLocationId": 12
        }))
        .expect("decode");

        assert_eq!(record.mo_number, Some(9001));
        assert_eq!(record.delivery_detail_id, Some(77));
        assert_eq!(record.picked_quantity, Some(Decimal::from(5)));
        assert!(record.reconcile_flagged());
    }

    #[test]
    fn rma_delivered_locator_is_attribute_ten() {
        let record: RmaConfirmation = serde_json::from_value(json!({
            "transactionType": "RMA_DELIVERY",
            "orderlineId": 44,
            "attribute10": "A1-01-02",
            "deliveredSubinventory": "STORES"
        }))
        .expect("decode");

        assert_eq!(record.delivered_locator(), Some("A1-01-02"));
        assert_eq!(record.order_line_id, Some(44));
        assert_eq!(RmaKind::classify(record.transaction_type.as_deref()), Some(RmaKind::Delivery));
    }

    #[test]
    fn transaction_types_are_matched_case_insensitively() {
        assert_eq!(PickKind::classify(Some("Out Bound Picking")), Some(PickKind::OutboundPicking));
        assert_eq!(PickKind::classify(Some("RMA_DELIVERY")), Some(PickKind::RmaDelivery));
        assert_eq!(PickKind::classify(Some("cycle count")), None);
        assert_eq!(PickKind::classify(None), None);
        assert_eq!(RmaKind::classify(Some("rma_receipt")), Some(RmaKind::Receipt));
    }

    #[test]
    fn combined_rma_body_tolerates_missing_pick_list() {
        let body: RmaPickSubmission =
            serde_json::from_value(json!({ "rmaConfirm": [{ "transactionType": "rma_receipt" }] }))
                .expect("decode");

        assert_eq!(body.rma_confirm.len(), 1);
        assert!(body.pick_confirm.is_empty());
    }
}
