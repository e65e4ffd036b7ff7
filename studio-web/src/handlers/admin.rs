use askama::Template;
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
    Form,
};
use chrono::Utc;
use serde::Deserialize;
use studio_core::error::AppError;
use studio_core::supabase::SupabaseError;
use tower_sessions::Session;

use super::{set_flash, take_flash, Flash, Layout};
use crate::admin::overview::{recent_receipts, DashboardStats, RECENT_RECEIPTS};
use crate::admin::receipts::{history, StatusForm};
use crate::admin::services::{toggled, ServiceFilter, ServiceForm};
use crate::admin::settings_editor::{BusinessProfileForm, PaymentForm, SaveOutcome, SettingsEditor};
use crate::admin::AdminTab;
use crate::models::money::format_money;
use crate::models::service::category_filter;
use crate::models::theme::THEMES;
use crate::models::user::{sign_in_again, AdminUser};
use crate::models::{BusinessSettings, Receipt, ReceiptStatus, ServiceCategory};
use crate::AppState;

pub struct TabLink {
    pub key: String,
    pub label: String,
    pub active: bool,
}

pub struct StatsView {
    pub receipt_count: usize,
    pub total_revenue: String,
    pub total_pending: String,
    pub paid: usize,
    pub partial: usize,
    pub pending: usize,
    pub active_services: usize,
}

pub struct ReceiptRow {
    pub id: String,
    pub number: String,
    pub customer: String,
    pub phone: String,
    pub event: String,
    pub event_date: String,
    pub items: u64,
    pub total: String,
    pub balance_due: String,
    pub status: String,
    pub created: String,
}

pub struct ServiceRow {
    pub id: String,
    pub name: String,
    pub category: String,
    pub category_label: String,
    pub price: String,
    pub raw_price: String,
    pub description: String,
    pub active: bool,
}

pub struct OptionView {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

pub struct ThemeCard {
    pub id: String,
    pub name: String,
    pub primary: String,
    pub accent: String,
    pub background: String,
    pub selected: bool,
}

#[derive(Template)]
#[template(path = "admin.html")]
pub struct AdminTemplate {
    pub layout: Layout,
    pub email: String,
    pub tab: String,
    pub tabs: Vec<TabLink>,
    pub flash: Flash,
    pub loading: bool,
    pub stats: StatsView,
    pub recent: Vec<ReceiptRow>,
    pub services: Vec<ServiceRow>,
    pub search: String,
    pub filter_categories: Vec<OptionView>,
    pub categories: Vec<OptionView>,
    pub receipts: Vec<ReceiptRow>,
    pub statuses: Vec<String>,
    pub settings: BusinessSettings,
    pub upi_id: String,
    pub themes: Vec<ThemeCard>,
    pub dark: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct DashboardParams {
    pub tab: Option<String>,
    pub q: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ThemeForm {
    pub theme: String,
}

fn receipt_row(receipt: &Receipt, currency: &str) -> ReceiptRow {
    ReceiptRow {
        id: receipt.id.clone(),
        number: receipt.receipt_number.clone(),
        customer: receipt.customer_name.clone(),
        phone: receipt.customer_phone.clone(),
        event: receipt.event_type.clone(),
        event_date: receipt.event_date.clone(),
        items: receipt.item_count(),
        total: format_money(currency, receipt.total),
        balance_due: format_money(currency, receipt.balance_due),
        status: receipt.status.as_str().to_string(),
        created: receipt
            .created_at
            .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default(),
    }
}

fn category_options(selected: Option<ServiceCategory>) -> Vec<OptionView> {
    ServiceCategory::ALL
        .iter()
        .map(|c| OptionView {
            value: c.as_str().to_string(),
            label: c.label().to_string(),
            selected: selected == Some(*c),
        })
        .collect()
}

pub async fn dashboard(
    State(state): State<AppState>,
    admin: AdminUser,
    session: Session,
    Query(params): Query<DashboardParams>,
) -> impl IntoResponse {
    let tab = AdminTab::parse(params.tab.as_deref());
    let settings = state.settings.current();
    let currency = settings.currency.clone();
    let services = state.services.snapshot();
    let receipts = state.receipts.snapshot();

    let stats = DashboardStats::compute(&receipts.data, &services.data);
    let filter = ServiceFilter {
        search: params.q.clone().unwrap_or_default(),
        category: category_filter(params.category.as_deref()),
    };

    let service_rows = filter
        .apply(&services.data)
        .into_iter()
        .map(|s| ServiceRow {
            category_label: s.category.label().to_string(),
            category: s.category.as_str().to_string(),
            price: format_money(&currency, s.price),
            raw_price: s.price.to_string(),
            id: s.id,
            name: s.name,
            description: s.description,
            active: s.is_active,
        })
        .collect();

    let themes = THEMES
        .iter()
        .map(|t| ThemeCard {
            id: t.id.to_string(),
            name: t.name.to_string(),
            primary: t.light.primary.to_string(),
            accent: t.light.accent.to_string(),
            background: t.light.background.to_string(),
            selected: t.id == settings.theme_id(),
        })
        .collect();

    AdminTemplate {
        layout: Layout::new("Admin", &settings),
        email: admin.email,
        tab: tab.as_str().to_string(),
        tabs: AdminTab::ALL
            .iter()
            .map(|t| TabLink {
                key: t.as_str().to_string(),
                label: t.label().to_string(),
                active: *t == tab,
            })
            .collect(),
        flash: take_flash(&session).await,
        loading: services.loading || receipts.loading,
        stats: StatsView {
            receipt_count: stats.receipt_count,
            total_revenue: format_money(&currency, stats.total_revenue),
            total_pending: format_money(&currency, stats.total_pending),
            paid: stats.paid,
            partial: stats.partial,
            pending: stats.pending,
            active_services: stats.active_services,
        },
        recent: recent_receipts(&receipts.data, RECENT_RECEIPTS)
            .iter()
            .map(|r| receipt_row(r, &currency))
            .collect(),
        services: service_rows,
        search: filter.search,
        filter_categories: category_options(filter.category),
        categories: category_options(None),
        receipts: history(&receipts.data).iter().map(|r| receipt_row(r, &currency)).collect(),
        statuses: ReceiptStatus::ALL.iter().map(|s| s.as_str().to_string()).collect(),
        upi_id: settings.upi_id.clone().unwrap_or_default(),
        dark: settings.is_dark(),
        themes,
        settings,
    }
}

fn back_to(tab: AdminTab) -> Redirect {
    Redirect::to(&format!("/admin?tab={}", tab.as_str()))
}

/// Turns a form or backend failure into the message shown above the panel.
fn failure_message(error: &AppError) -> String {
    match error {
        AppError::ValidationError(errors) => errors
            .field_errors()
            .values()
            .flat_map(|errs| errs.iter())
            .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
            .unwrap_or_else(|| "Please check the form and try again".to_string()),
        AppError::BadRequest(e) | AppError::NotFound(e) => e.to_string(),
        other => other.to_string(),
    }
}

/// Records the outcome of a mutation as a flash and returns to `tab`. A
/// rejected token ends the admin session instead.
async fn finish(session: &Session, tab: AdminTab, outcome: Result<String, AppError>) -> Result<Response, AppError> {
    let flash = match outcome {
        Ok(message) => Flash::info(message),
        Err(AppError::Unauthorized(e)) => {
            tracing::warn!(tab = tab.as_str(), error = %e, "Admin token rejected, signing out");
            return Ok(sign_in_again(session).await);
        }
        Err(e) => {
            tracing::warn!(tab = tab.as_str(), error = %e, "Admin action failed");
            Flash::error(failure_message(&e))
        }
    };
    set_flash(session, flash).await?;
    Ok(back_to(tab).into_response())
}

fn backend(e: SupabaseError) -> AppError {
    match e.status() {
        Some(401) => AppError::Unauthorized(anyhow::anyhow!(e.user_message())),
        _ => AppError::BadRequest(anyhow::anyhow!(e.user_message())),
    }
}

pub async fn create_service(
    State(state): State<AppState>,
    admin: AdminUser,
    session: Session,
    Form(form): Form<ServiceForm>,
) -> Result<Response, AppError> {
    let outcome = async {
        let service = form.validated()?.into_new_service(Utc::now());
        state.services.add(&service, admin.token()).await.map_err(backend)?;
        tracing::info!(service_id = %service.id, name = %service.name, "Service added");
        Ok::<_, AppError>(format!("Added {}", service.name))
    }
    .await;
    finish(&session, AdminTab::Services, outcome).await
}

pub async fn update_service(
    State(state): State<AppState>,
    admin: AdminUser,
    session: Session,
    Path(id): Path<String>,
    Form(form): Form<ServiceForm>,
) -> Result<Response, AppError> {
    let outcome = async {
        let existing = state
            .services
            .find(&id)
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Service not found")))?;
        let service = form.validated()?.apply_to(&existing);
        state.services.update(&service, admin.token()).await.map_err(backend)?;
        tracing::info!(service_id = %id, "Service updated");
        Ok::<_, AppError>(format!("Updated {}", service.name))
    }
    .await;
    finish(&session, AdminTab::Services, outcome).await
}

pub async fn toggle_service(
    State(state): State<AppState>,
    admin: AdminUser,
    session: Session,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let outcome = async {
        let existing = state
            .services
            .find(&id)
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Service not found")))?;
        let service = toggled(&existing);
        state.services.update(&service, admin.token()).await.map_err(backend)?;
        tracing::info!(service_id = %id, active = service.is_active, "Service visibility changed");
        Ok::<_, AppError>(if service.is_active {
            format!("{} is visible to customers", service.name)
        } else {
            format!("{} is hidden from customers", service.name)
        })
    }
    .await;
    finish(&session, AdminTab::Services, outcome).await
}

pub async fn delete_service(
    State(state): State<AppState>,
    admin: AdminUser,
    session: Session,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let outcome = async {
        state.services.delete(&id, admin.token()).await.map_err(backend)?;
        tracing::info!(service_id = %id, "Service deleted");
        Ok::<_, AppError>("Service deleted".to_string())
    }
    .await;
    finish(&session, AdminTab::Services, outcome).await
}

pub async fn update_receipt_status(
    State(state): State<AppState>,
    admin: AdminUser,
    session: Session,
    Path(id): Path<String>,
    Form(form): Form<StatusForm>,
) -> Result<Response, AppError> {
    let outcome = async {
        let status = form.parse()?;
        let existing = state
            .receipts
            .find(&id)
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Receipt not found")))?;
        state
            .receipts
            .update(&existing.with_status(status), admin.token())
            .await
            .map_err(backend)?;
        tracing::info!(receipt = %existing.receipt_number, status = status.as_str(), "Receipt status changed");
        Ok::<_, AppError>(format!("{} marked {}", existing.receipt_number, status.as_str()))
    }
    .await;
    finish(&session, AdminTab::Receipts, outcome).await
}

pub async fn delete_receipt(
    State(state): State<AppState>,
    admin: AdminUser,
    session: Session,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let outcome = async {
        state.receipts.delete(&id, admin.token()).await.map_err(backend)?;
        tracing::info!(receipt_id = %id, "Receipt deleted");
        Ok::<_, AppError>("Receipt deleted".to_string())
    }
    .await;
    finish(&session, AdminTab::Receipts, outcome).await
}

/// Edits a local copy of the settings and pushes it if anything changed.
async fn save_settings(
    state: &AppState,
    admin: &AdminUser,
    change: impl FnOnce(&mut BusinessSettings),
) -> Result<String, AppError> {
    let mut editor = SettingsEditor::new(state.settings.current());
    editor.edit(change);
    match editor.save(&state.settings, admin.token()).await {
        Ok(SaveOutcome::Saved) => Ok("Settings saved".to_string()),
        Ok(SaveOutcome::NoChanges) => Ok("No changes to save".to_string()),
        Err(e) => Err(backend(e)),
    }
}

pub async fn save_business(
    State(state): State<AppState>,
    admin: AdminUser,
    session: Session,
    Form(form): Form<BusinessProfileForm>,
) -> Result<Response, AppError> {
    let outcome = save_settings(&state, &admin, |s| form.apply(s)).await;
    finish(&session, AdminTab::Settings, outcome).await
}

pub async fn save_payments(
    State(state): State<AppState>,
    admin: AdminUser,
    session: Session,
    Form(form): Form<PaymentForm>,
) -> Result<Response, AppError> {
    let outcome = save_settings(&state, &admin, |s| form.apply(s)).await;
    finish(&session, AdminTab::Payments, outcome).await
}

pub async fn set_theme(
    State(state): State<AppState>,
    admin: AdminUser,
    session: Session,
    Form(form): Form<ThemeForm>,
) -> Result<Response, AppError> {
    let outcome = if THEMES.iter().any(|t| t.id == form.theme) {
        save_settings(&state, &admin, |s| s.theme_preference = Some(form.theme)).await
    } else {
        Err(AppError::BadRequest(anyhow::anyhow!("Unknown theme '{}'", form.theme)))
    };
    finish(&session, AdminTab::Themes, outcome).await
}

pub async fn toggle_dark_mode(
    State(state): State<AppState>,
    admin: AdminUser,
    session: Session,
) -> Result<Response, AppError> {
    let outcome = save_settings(&state, &admin, |s| s.dark_mode = Some(!s.is_dark())).await;
    finish(&session, AdminTab::Themes, outcome).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Named {
        #[validate(length(min = 1, message = "Service name is required"))]
        name: String,
    }

    #[test]
    fn validation_failures_show_field_message() {
        let errors = Named { name: String::new() }.validate().unwrap_err();
        let message = failure_message(&AppError::ValidationError(errors));
        assert_eq!(message, "Service name is required");
    }

    #[test]
    fn backend_failures_show_provider_message() {
        let err = backend(SupabaseError::Api {
            status: 403,
            code: Some("42501".to_string()),
            message: "new row violates row-level security policy".to_string(),
            details: None,
            hint: None,
        });
        assert_eq!(failure_message(&err), "new row violates row-level security policy");
    }

    #[test]
    fn expired_token_is_unauthorized() {
        let err = backend(SupabaseError::Api {
            status: 401,
            code: Some("PGRST301".to_string()),
            message: "JWT expired".to_string(),
            details: None,
            hint: None,
        });
        assert!(matches!(err, AppError::Unauthorized(_)));
    }
}
