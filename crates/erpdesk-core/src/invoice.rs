// ── Proforma invoice from a lead ──
//
// The lead must carry full billing and shipping details before a
// proforma invoice can be raised against it. The payload combines the
// seller account, the lead, the signed-in user and the product lines.

use chrono::NaiveDate;
use erpdesk_api::FieldErrors;
use serde::Serialize;
use serde_json::{Value, json};
use tracing::info;

use crate::backend::Backend;
use crate::error::CoreError;
use crate::model::Record;
use crate::session::Session;

pub const PROFORMA_CREATE_PATH: &str = "api/invoice/create-lead-proforma-invoice/";
pub const SELLER_ACCOUNTS_PATH: &str = "api/invoice/seller-account/?type=all";
pub const PRICE_LIST_PATH: &str = "api/product/price-list/?type=all";
pub const LEADS_PATH: &str = "api/lead/list-lead/";

// ── Lead completeness ────────────────────────────────────────────────

/// Fields a lead must carry before it can be invoiced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeadCompleteness {
    pub missing: Vec<&'static str>,
}

impl LeadCompleteness {
    const REQUIRED: [&'static str; 10] = [
        "contact",
        "address",
        "state",
        "city",
        "pincode",
        "shipping_address",
        "shipping_state",
        "shipping_city",
        "shipping_pincode",
        "company",
    ];

    pub fn check(lead: &Record) -> Self {
        let present = |field: &str| !lead.text(field).trim().is_empty();
        let mut missing: Vec<&'static str> = Self::REQUIRED
            .iter()
            .copied()
            .filter(|f| !present(f))
            .collect();
        if !present("pan_number") && !present("gst_number") {
            missing.push("pan_number");
        }
        Self { missing }
    }

    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }

    fn into_error(self) -> CoreError {
        let mut errors = FieldErrors::default();
        for field in self.missing {
            let message = if field == "pan_number" {
                "PAN or GST number is required"
            } else {
                "required on the lead"
            };
            errors.0.entry(field.to_owned()).or_default().push(message.to_owned());
        }
        CoreError::Invalid { errors }
    }
}

// ── Form inputs ──────────────────────────────────────────────────────

/// One product line of the invoice.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductLine {
    pub product: String,
    pub unit: String,
    pub quantity: String,
    pub rate: String,
    pub requested_date: NaiveDate,
    pub special_instructions: String,
}

impl ProductLine {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            product: String::new(),
            unit: String::new(),
            quantity: String::new(),
            rate: String::new(),
            requested_date: today,
            special_instructions: String::new(),
        }
    }

    /// Pick `product`, taking its unit from the price list.
    pub fn select_product(&mut self, product: &str, price_list: &[Record]) {
        self.product = product.to_owned();
        self.unit = price_list
            .iter()
            .find(|p| p.text("product") == product)
            .map(|p| p.text("unit"))
            .unwrap_or_default();
    }
}

/// Free-form inputs of the invoice screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProformaForm {
    pub place_of_supply: String,
    pub transporter_name: String,
    /// Verbal orders carry `verbal` as the buyer order number.
    pub verbal: bool,
    pub buyer_order_no: String,
    pub buyer_order_date: Option<NaiveDate>,
    pub payment_terms: String,
    pub delivery_terms: String,
    /// Raise for price approval instead of as approved.
    pub price_approval: bool,
}

impl Default for ProformaForm {
    fn default() -> Self {
        Self {
            place_of_supply: String::new(),
            transporter_name: String::new(),
            verbal: true,
            buyer_order_no: String::new(),
            buyer_order_date: None,
            payment_terms: String::new(),
            delivery_terms: String::new(),
            price_approval: false,
        }
    }
}

// ── Draft ────────────────────────────────────────────────────────────

/// A ready-to-submit proforma invoice body.
#[derive(Debug, Clone, PartialEq)]
pub struct ProformaDraft {
    body: Value,
}

impl ProformaDraft {
    /// Assemble the payload. Fails if the lead is incomplete.
    pub fn build(
        session: &Session,
        seller: &Record,
        lead: &Record,
        form: &ProformaForm,
        products: &[ProductLine],
        today: NaiveDate,
    ) -> Result<Self, CoreError> {
        let completeness = LeadCompleteness::check(lead);
        if !completeness.is_complete() {
            return Err(completeness.into_error());
        }

        let user = session.user();
        let s = |k: &str| seller.text(k);
        let l = |k: &str| lead.text(k);
        let or_null = |v: String| if v.is_empty() { Value::Null } else { Value::String(v) };

        let body = json!({
            "type": "Lead",
            "raised_by": user.email,
            "raised_by_first_name": user.first_name,
            "raised_by_last_name": user.last_name,
            "seller_account": s("unit"),
            "seller_address": s("address"),
            "seller_pincode": s("pincode"),
            "seller_state": s("state"),
            "seller_city": s("city"),
            "seller_gst": or_null(s("gst_number")),
            "seller_pan": s("pan_number"),
            "seller_state_code": s("state_code"),
            "seller_cin": s("cin_number"),
            "seller_email": s("email"),
            "seller_contact": s("contact"),
            "seller_bank_name": s("bank_name"),
            "seller_account_no": s("current_account_no"),
            "seller_ifsc_code": s("ifsc_code"),
            "seller_branch": s("branch"),
            "lead": l("lead_id"),
            "contact_person_name": l("name"),
            "contact": l("contact"),
            "alternate_contact": l("alternate_contact"),
            "company_name": l("company"),
            "gst_number": or_null(l("gst_number")),
            "pan_number": l("pan_number"),
            "billing_address": l("address"),
            "billing_state": l("state"),
            "billing_city": l("city"),
            "billing_pincode": l("pincode"),
            "address": l("shipping_address"),
            "pincode": l("shipping_pincode"),
            "state": l("shipping_state"),
            "city": l("shipping_city"),
            "place_of_supply": form.place_of_supply,
            "transporter_name": form.transporter_name,
            "buyer_order_no": if form.verbal { "verbal" } else { form.buyer_order_no.as_str() },
            "buyer_order_date": form.buyer_order_date.unwrap_or(today),
            "payment_terms": form.payment_terms,
            "delivery_terms": form.delivery_terms,
            "status": if form.price_approval { "Price Approval" } else { "Approved" },
            "price_approval": form.price_approval,
            "products": products,
        });
        Ok(Self { body })
    }

    pub fn body(&self) -> &Value {
        &self.body
    }

    /// POST the draft. A 400 carries every `field: message` for the error queue.
    pub async fn submit<B: Backend>(&self, backend: &B) -> Result<Value, CoreError> {
        let response = backend.post(PROFORMA_CREATE_PATH, &self.body).await?;
        info!(lead = %self.body["lead"], "proforma invoice raised");
        Ok(response)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::session::UserProfile;

    fn lead() -> Record {
        Record::try_from(json!({
            "lead_id": 41, "name": "Ravi", "contact": "+919999999999",
            "company": "Acme", "address": "1 Main Rd", "state": "Delhi",
            "city": "Delhi", "pincode": 110_001, "shipping_address": "2 Dock Rd",
            "shipping_state": "Delhi", "shipping_city": "Delhi",
            "shipping_pincode": 110_002, "pan_number": null, "gst_number": "07AAAAA0000A1Z5"
        }))
        .unwrap()
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    #[test]
    fn gst_alone_satisfies_tax_id() {
        assert!(LeadCompleteness::check(&lead()).is_complete());
    }

    #[test]
    fn incomplete_lead_lists_missing_fields() {
        let mut fields = lead().into_fields();
        fields.insert("shipping_city".into(), Value::Null);
        fields.insert("gst_number".into(), Value::Null);
        let check = LeadCompleteness::check(&Record::from(fields));
        assert_eq!(check.missing, vec!["shipping_city", "pan_number"]);
    }

    #[test]
    fn verbal_order_and_status_mapping() {
        let session = Session::new(UserProfile {
            email: "ops@example.com".into(),
            ..UserProfile::default()
        });
        let seller = Record::try_from(json!({"unit": "Delhi Plant", "gst_number": ""})).unwrap();
        let mut line = ProductLine::new(date());
        let price_list = vec![Record::try_from(json!({"product": "Tape", "unit": "ROLL"})).unwrap()];
        line.select_product("Tape", &price_list);

        let form = ProformaForm {
            price_approval: true,
            ..ProformaForm::default()
        };
        let draft = ProformaDraft::build(&session, &seller, &lead(), &form, &[line], date()).unwrap();
        let body = draft.body();
        assert_eq!(body["buyer_order_no"], json!("verbal"));
        assert_eq!(body["status"], json!("Price Approval"));
        assert_eq!(body["raised_by"], json!("ops@example.com"));
        assert_eq!(body["seller_gst"], Value::Null);
        assert_eq!(body["buyer_order_date"], json!("2024-05-01"));
        assert_eq!(body["products"][0]["unit"], json!("ROLL"));
    }

    #[test]
    fn incomplete_lead_is_a_local_error() {
        let session = Session::anonymous();
        let empty = Record::default();
        let err = ProformaDraft::build(&session, &empty, &empty, &ProformaForm::default(), &[], date())
            .unwrap_err();
        assert!(err.is_local());
        assert!(err.field_messages().len() > 5);
    }
}
