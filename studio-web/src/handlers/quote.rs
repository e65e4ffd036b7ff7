use askama::Template;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Form,
};
use chrono::Utc;
use serde::Deserialize;
use studio_core::error::AppError;
use tower_sessions::Session;
use validator::Validate;

use super::Layout;
use crate::builder::storage::{clear_draft, load_draft, save_draft};
use crate::builder::{DraftDetails, ReceiptDraft, EVENT_TYPES, MAX_QUANTITY};
use crate::handoff::{hand_off, whatsapp_link};
use crate::models::money::format_money;
use crate::models::service::{category_filter, customer_catalog, ServiceCategory};
use crate::models::BusinessSettings;
use crate::AppState;

pub struct CategoryTab {
    pub key: String,
    pub label: String,
    pub icon: String,
    pub active: bool,
}

pub struct ServiceCard {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: String,
    pub quantity: u32,
}

pub struct DraftLine {
    pub id: String,
    pub name: String,
    pub quantity: u32,
    pub fewer: u32,
    pub more: u32,
    pub unit_price: String,
    pub total: String,
}

pub struct EventTypeOption {
    pub name: String,
    pub selected: bool,
}

pub struct ContactView {
    pub phone: String,
    pub email: String,
    pub instagram: String,
    pub address: String,
    pub whatsapp_url: String,
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub layout: Layout,
    pub tagline: String,
    pub contact: ContactView,
    pub category: String,
    pub tabs: Vec<CategoryTab>,
    pub services: Vec<ServiceCard>,
    pub loading: bool,
    pub draft: ReceiptDraft,
    pub lines: Vec<DraftLine>,
    pub total: String,
    pub event_types: Vec<EventTypeOption>,
    pub today: String,
    pub error: String,
}

pub struct ReceiptLine {
    pub name: String,
    pub quantity: u32,
    pub total: String,
}

#[derive(Template)]
#[template(path = "handoff.html")]
pub struct HandoffTemplate {
    pub layout: Layout,
    pub receipt_number: String,
    pub customer_name: String,
    pub event_type: String,
    pub event_date: String,
    pub lines: Vec<ReceiptLine>,
    pub subtotal: String,
    pub tax: String,
    pub total: String,
    pub bank_details: String,
    pub terms: String,
    pub whatsapp_url: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct CatalogParams {
    pub category: Option<String>,
}

/// Posted by every cart button. The buttons submit the quote form, so the
/// customer fields typed so far arrive with the cart change.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct CartForm {
    pub category: Option<String>,
    #[validate(range(max = 999, message = "Quantity is too large"))]
    pub quantity: Option<i64>,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_email: Option<String>,
    pub event_date: Option<String>,
    pub event_type: Option<String>,
    pub notes: Option<String>,
}

impl CartForm {
    /// `None` when the request did not come from the quote form.
    fn take_details(&mut self) -> Option<DraftDetails> {
        let customer_name = self.customer_name.take()?;
        Some(DraftDetails {
            customer_name,
            customer_phone: self.customer_phone.take().unwrap_or_default(),
            customer_email: self.customer_email.take().unwrap_or_default(),
            event_date: self.event_date.take().unwrap_or_default(),
            event_type: self.event_type.take().unwrap_or_default(),
            notes: self.notes.take().unwrap_or_default(),
        })
    }
}

fn category_tabs(active: Option<ServiceCategory>) -> Vec<CategoryTab> {
    let all = CategoryTab {
        key: "all".to_string(),
        label: "All".to_string(),
        icon: "🎯".to_string(),
        active: active.is_none(),
    };
    std::iter::once(all)
        .chain(ServiceCategory::ALL.iter().map(|c| CategoryTab {
            key: c.as_str().to_string(),
            label: c.label().to_string(),
            icon: c.icon().to_string(),
            active: active == Some(*c),
        }))
        .collect()
}

fn render_index(state: &AppState, draft: ReceiptDraft, category: Option<&str>, error: String) -> IndexTemplate {
    let settings = state.settings.current();
    let services = state.services.snapshot();
    let active = category_filter(category);
    let currency = settings.currency.as_str();

    let cards = customer_catalog(&services.data, active)
        .into_iter()
        .map(|s| ServiceCard {
            quantity: draft.quantity_of(&s.id),
            price: format_money(currency, s.price),
            id: s.id,
            name: s.name,
            description: s.description,
        })
        .collect();

    let lines = draft
        .selected_items
        .iter()
        .map(|item| DraftLine {
            id: item.service_id.clone(),
            name: item.service_name.clone(),
            quantity: item.quantity,
            fewer: item.quantity.saturating_sub(1),
            more: item.quantity.saturating_add(1).min(MAX_QUANTITY),
            unit_price: format_money(currency, item.price),
            total: format_money(currency, item.total),
        })
        .collect();

    let event_types = EVENT_TYPES
        .iter()
        .map(|name| EventTypeOption {
            name: name.to_string(),
            selected: *name == draft.event_type,
        })
        .collect();

    IndexTemplate {
        layout: Layout::new("Get a Quote", &settings),
        tagline: settings.tagline.clone(),
        contact: contact_view(&settings),
        category: active.map_or("all", |c| c.as_str()).to_string(),
        tabs: category_tabs(active),
        services: cards,
        loading: services.loading,
        total: format_money(currency, draft.total()),
        lines,
        event_types,
        today: Utc::now().format("%Y-%m-%d").to_string(),
        draft,
        error,
    }
}

fn contact_view(settings: &BusinessSettings) -> ContactView {
    ContactView {
        phone: settings.phone.clone(),
        email: settings.email.clone(),
        instagram: settings.instagram.clone(),
        address: settings.address.clone(),
        whatsapp_url: whatsapp_link(&settings.whatsapp_number, None).unwrap_or_default(),
    }
}

fn back_to_catalog(category: Option<&str>) -> Redirect {
    match category_filter(category) {
        Some(c) => Redirect::to(&format!("/?category={}#quote", c.as_str())),
        None => Redirect::to("/#quote"),
    }
}

pub async fn index(
    State(state): State<AppState>,
    session: Session,
    Query(params): Query<CatalogParams>,
) -> impl IntoResponse {
    let draft = load_draft(&session).await;
    render_index(&state, draft, params.category.as_deref(), String::new())
}

async fn load_with_details(session: &Session, form: &mut CartForm) -> ReceiptDraft {
    let mut draft = load_draft(session).await;
    if let Some(details) = form.take_details() {
        draft.apply_details(details);
    }
    draft
}

pub async fn add_item(
    State(state): State<AppState>,
    session: Session,
    Path(service_id): Path<String>,
    Form(mut form): Form<CartForm>,
) -> Result<Redirect, AppError> {
    let service = state
        .services
        .find(&service_id)
        .filter(|s| s.is_active)
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Service {service_id} is not available")))?;

    let mut draft = load_with_details(&session, &mut form).await;
    draft.add_service(&service);
    save_draft(&session, &draft).await?;

    Ok(back_to_catalog(form.category.as_deref()))
}

pub async fn set_quantity(
    session: Session,
    Path(service_id): Path<String>,
    Form(mut form): Form<CartForm>,
) -> Result<Redirect, AppError> {
    form.validate()?;
    let quantity = form
        .quantity
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("Missing quantity")))?;

    let mut draft = load_with_details(&session, &mut form).await;
    draft.update_quantity(&service_id, quantity);
    save_draft(&session, &draft).await?;

    Ok(back_to_catalog(form.category.as_deref()))
}

pub async fn remove_item(
    session: Session,
    Path(service_id): Path<String>,
    Form(mut form): Form<CartForm>,
) -> Result<Redirect, AppError> {
    let mut draft = load_with_details(&session, &mut form).await;
    draft.remove_item(&service_id);
    save_draft(&session, &draft).await?;

    Ok(back_to_catalog(form.category.as_deref()))
}

pub async fn save_details(session: Session, Form(mut form): Form<CartForm>) -> Result<Redirect, AppError> {
    let draft = load_with_details(&session, &mut form).await;
    save_draft(&session, &draft).await?;

    Ok(back_to_catalog(form.category.as_deref()))
}

pub async fn submit(
    State(state): State<AppState>,
    session: Session,
    Form(details): Form<DraftDetails>,
) -> Result<Response, AppError> {
    let mut draft = load_draft(&session).await;
    draft.apply_details(details);
    let settings = state.settings.current();
    let now = Utc::now();

    let receipt = match draft.submit(&settings, &state.studio.receipt_prefix, state.receipts.len(), now) {
        Ok(receipt) => receipt,
        Err(e) => {
            save_draft(&session, &draft).await?;
            let page = render_index(&state, draft, None, e.to_string());
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response());
        }
    };
    clear_draft(&session).await?;

    tracing::info!(
        receipt = %receipt.receipt_number,
        items = receipt.items.len(),
        total = %receipt.total,
        "Quote submitted"
    );

    let handoff = hand_off(state.receipts.clone(), receipt, &settings, now);
    let currency = settings.currency.as_str();
    let receipt = &handoff.receipt;

    Ok(HandoffTemplate {
        layout: Layout::new("Quote Sent", &settings),
        receipt_number: receipt.receipt_number.clone(),
        customer_name: receipt.customer_name.clone(),
        event_type: receipt.event_type.clone(),
        event_date: if receipt.event_date.is_empty() {
            "TBD".to_string()
        } else {
            receipt.event_date.clone()
        },
        lines: receipt
            .items
            .iter()
            .map(|item| ReceiptLine {
                name: item.service_name.clone(),
                quantity: item.quantity,
                total: format_money(currency, item.total),
            })
            .collect(),
        subtotal: format_money(currency, receipt.subtotal),
        tax: format_money(currency, receipt.tax),
        total: format_money(currency, receipt.total),
        bank_details: settings.bank_details.clone(),
        terms: settings.terms_and_conditions.clone(),
        whatsapp_url: handoff.whatsapp_url.clone().unwrap_or_default(),
    }
    .into_response())
}
