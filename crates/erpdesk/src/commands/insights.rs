//! `postal`, `dashboard` and `invoice` handlers.

use std::fmt::Write as _;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;

use erpdesk_core::dashboard::{self, ForecastPoint};
use erpdesk_core::invoice::{LEADS_PATH, PRICE_LIST_PATH, SELLER_ACCOUNTS_PATH};
use erpdesk_core::{
    Backend, CoreError, Dashboard, ErpClient, PostalClient, ProductLine, ProformaDraft,
    ProformaForm, Record, Session, is_valid_pincode,
};

use crate::cli::{DashboardArgs, GlobalOpts, InvoiceArgs, PostalArgs};
use crate::error::CliError;
use crate::output;

// ── postal ──────────────────────────────────────────────────────────

#[derive(Serialize)]
struct PostalResult {
    pincode: String,
    state: String,
    city: String,
}

pub async fn postal(client: PostalClient, args: PostalArgs, global: &GlobalOpts) -> Result<(), CliError> {
    if !is_valid_pincode(&args.pincode) {
        return Err(CliError::Validation {
            field: "pincode".into(),
            reason: "expected six digits".into(),
        });
    }
    let place = client
        .lookup(&args.pincode)
        .await
        .map_err(CoreError::from)?
        .ok_or_else(|| CliError::NotFound {
            path: format!("pincode/{}", args.pincode),
        })?;

    let result = PostalResult {
        pincode: args.pincode,
        state: place.state,
        city: place.district,
    };
    let out = output::render_single(
        &global.output,
        &result,
        |r| format!("{}: {}, {}", r.pincode, r.city, r.state),
        |r| format!("{}\t{}", r.state, r.city),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}

// ── dashboard ───────────────────────────────────────────────────────

fn dashboard_detail(d: &Dashboard) -> String {
    let mut out = String::new();
    match d.funnel {
        Some(ref funnel) => {
            let _ = writeln!(out, "Lead funnel ({} total)", funnel.total());
            for stage in &funnel.stages {
                let _ = writeln!(out, "  {:<16}{:>8}", stage.label, stage.value);
            }
        }
        None => {
            let _ = writeln!(out, "Lead funnel: unavailable");
        }
    }
    match d.customers {
        Some(c) if c.is_empty() => {
            let _ = writeln!(out, "Customers: no data");
        }
        Some(c) => {
            let _ = writeln!(out, "Customers: {} active, {} dead, {} new", c.active, c.dead, c.new);
        }
        None => {
            let _ = writeln!(out, "Customers: unavailable");
        }
    }
    match d.dispatch {
        Some(ref dispatch) => {
            let bars: Vec<String> = dispatch
                .bars
                .iter()
                .map(|b| format!("{} {}", b.name(), b.value))
                .collect();
            let _ = writeln!(out, "Dispatch: {}", bars.join("  "));
        }
        None => {
            let _ = writeln!(out, "Dispatch: unavailable");
        }
    }
    match d.forecast {
        Some(ref points) => out.push_str(&forecast_detail(points)),
        None => {
            let _ = writeln!(out, "Forecast: unavailable");
        }
    }
    out.trim_end().to_owned()
}

fn forecast_detail(points: &[ForecastPoint]) -> String {
    let mut out = String::from("Forecast\n");
    for p in points {
        let _ = writeln!(out, "  {:<12}{:>12.2}{:>12.2}", p.period, p.actual, p.forecast);
    }
    out
}

pub async fn dashboard(client: Arc<ErpClient>, args: DashboardArgs, global: &GlobalOpts) -> Result<(), CliError> {
    if let Some(assign_to) = args.assign_to {
        let points = dashboard::forecast_for(client.as_ref(), &assign_to).await?;
        let out = output::render_single(
            &global.output,
            &points,
            |p| forecast_detail(p).trim_end().to_owned(),
            |p| p.iter().map(|f| f.period.clone()).collect::<Vec<_>>().join("\n"),
        );
        output::print_output(&out, global.quiet);
        return Ok(());
    }

    let session = Session::load(client.as_ref()).await?;
    let board = Dashboard::load(client.as_ref(), &session).await;
    let out = output::render_single(&global.output, &board, dashboard_detail, |_| {
        session.user().display_name()
    });
    output::print_output(&out, global.quiet);
    Ok(())
}

// ── invoice ─────────────────────────────────────────────────────────

/// Rows of an `?type=all` list, bare or enveloped.
async fn fetch_rows<B: Backend>(backend: &B, path: &str) -> Result<Vec<Record>, CliError> {
    let body = backend.get(path, &[]).await?;
    let rows = match body {
        Value::Array(rows) => rows,
        Value::Object(mut map) => match map.remove("results") {
            Some(Value::Array(rows)) => rows,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    };
    Ok(rows.into_iter().filter_map(|v| Record::try_from(v).ok()).collect())
}

fn parse_date(field: &str, raw: &str) -> Result<NaiveDate, CliError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|e| CliError::Validation {
        field: field.into(),
        reason: format!("expected YYYY-MM-DD: {e}"),
    })
}

fn parse_line(raw: &str, price_list: &[Record], today: NaiveDate) -> Result<ProductLine, CliError> {
    let mut parts = raw.splitn(3, ':');
    let (Some(product), Some(quantity), Some(rate)) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(CliError::Validation {
            field: "product".into(),
            reason: format!("expected PRODUCT:QTY:RATE, got '{raw}'"),
        });
    };
    let mut line = ProductLine::new(today);
    line.select_product(product, price_list);
    line.quantity = quantity.to_owned();
    line.rate = rate.to_owned();
    Ok(line)
}

pub async fn invoice(client: Arc<ErpClient>, args: InvoiceArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let backend = client.as_ref();
    let today = chrono::Local::now().date_naive();

    let (session, lead, sellers, price_list) = tokio::try_join!(
        async { Ok::<_, CliError>(Session::load(backend).await?) },
        async {
            let body = backend.get(&format!("{LEADS_PATH}{}/", args.lead), &[]).await?;
            Record::try_from(body).map_err(|_| CliError::NotFound {
                path: format!("{LEADS_PATH}{}/", args.lead),
            })
        },
        fetch_rows(backend, SELLER_ACCOUNTS_PATH),
        fetch_rows(backend, PRICE_LIST_PATH),
    )?;

    let seller = sellers
        .into_iter()
        .find(|s| s.text("unit") == args.seller || s.text("id") == args.seller)
        .ok_or_else(|| CliError::NotFound {
            path: format!("seller account '{}'", args.seller),
        })?;

    let lines = args
        .products
        .iter()
        .map(|raw| parse_line(raw, &price_list, today))
        .collect::<Result<Vec<_>, _>>()?;

    let form = ProformaForm {
        place_of_supply: args.place_of_supply.unwrap_or_default(),
        transporter_name: args.transporter.unwrap_or_default(),
        verbal: args.buyer_order_no.is_none(),
        buyer_order_no: args.buyer_order_no.unwrap_or_default(),
        buyer_order_date: args
            .buyer_order_date
            .as_deref()
            .map(|d| parse_date("buyer-order-date", d))
            .transpose()?,
        payment_terms: args.payment_terms.unwrap_or_default(),
        delivery_terms: args.delivery_terms.unwrap_or_default(),
        price_approval: args.price_approval,
    };

    let draft = ProformaDraft::build(&session, &seller, &lead, &form, &lines, today)?;
    if args.dry_run {
        let out = output::render_single(
            &global.output,
            draft.body(),
            |b| serde_json::to_string_pretty(b).unwrap_or_default(),
            |b| b["lead"].to_string(),
        );
        output::print_output(&out, global.quiet);
        return Ok(());
    }

    let response = draft.submit(backend).await?;
    let number = response
        .get("pi_number")
        .map(erpdesk_core::model::display_value)
        .unwrap_or_default();
    output::success(
        &global.color,
        global.quiet,
        &format!("proforma invoice {number} raised for lead {}", args.lead),
    );
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn product_line_takes_unit_from_price_list() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let prices = vec![Record::try_from(json!({"product": "Tape", "unit": "ROLL"})).unwrap()];
        let line = parse_line("Tape:10:42.5", &prices, today).unwrap();
        assert_eq!(line.unit, "ROLL");
        assert_eq!(line.quantity, "10");
        assert_eq!(line.rate, "42.5");
        assert!(parse_line("Tape:10", &prices, today).is_err());
    }

    #[test]
    fn dashboard_detail_marks_missing_panels() {
        let text = dashboard_detail(&Dashboard::default());
        assert!(text.contains("Lead funnel: unavailable"));
        assert!(text.contains("Forecast: unavailable"));
    }
}
