//! Support ticket queue.

use askama::Template;
use axum::{
    Form,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use pawpal_core::{
    PageRequest, SupportTicket, TicketFilter, TicketId, TicketStatus, TicketUpdate, paginate,
};
use serde::Deserialize;
use tracing::instrument;

use super::{Nav, PagerView, SelectOption, empty_string_as_none, or_degrade, render};
use crate::api::ApiError;
use crate::error::Result;
use crate::middleware::RequireStaff;
use crate::models::CurrentStaff;
use crate::state::AppState;

/// Ticket queue query parameters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TicketsQuery {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub status: Option<TicketStatus>,
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub page: Option<usize>,
}

impl TicketsQuery {
    #[must_use]
    pub fn filter(&self) -> TicketFilter {
        TicketFilter {
            status: self.status,
            search: self.q.clone(),
        }
    }

    fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(status) = self.status {
            pairs.push(("status", status.as_str().to_string()));
        }
        if let Some(q) = self.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            pairs.push(("q", q.to_string()));
        }
        pairs
    }
}

/// Ticket row for the queue.
#[derive(Debug, Clone)]
pub struct TicketRow {
    pub id: TicketId,
    pub subject: String,
    pub customer: String,
    pub status: &'static str,
    pub status_class: &'static str,
    pub assignee: String,
    pub created_at: String,
}

impl From<&SupportTicket> for TicketRow {
    fn from(ticket: &SupportTicket) -> Self {
        Self {
            id: ticket.id,
            subject: ticket.subject.clone(),
            customer: format!("{} <{}>", ticket.customer_name, ticket.customer_email),
            status: ticket.status.label(),
            status_class: status_class(ticket.status),
            assignee: ticket.assignee.clone().unwrap_or_else(|| "-".to_string()),
            created_at: ticket.created_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

const fn status_class(status: TicketStatus) -> &'static str {
    match status {
        TicketStatus::Open => "badge-open",
        TicketStatus::InProgress => "badge-progress",
        TicketStatus::Resolved => "badge-resolved",
        TicketStatus::Closed => "badge-closed",
    }
}

/// Ticket queue template.
#[derive(Template)]
#[template(path = "tickets/index.html")]
pub struct TicketsTemplate {
    pub nav: Nav,
    pub tickets: Vec<TicketRow>,
    pub total: usize,
    pub status_options: Vec<SelectOption>,
    pub q: String,
    pub pager: PagerView,
    pub error: Option<String>,
}

/// Ticket detail template.
#[derive(Template)]
#[template(path = "tickets/show.html")]
pub struct TicketTemplate {
    pub nav: Nav,
    pub ticket: TicketRow,
    pub message: String,
    /// Statuses the ticket may move to, current one included.
    pub status_options: Vec<SelectOption>,
    pub assignee: String,
    pub response: String,
    pub error: Option<String>,
}

/// Ticket update form data.
#[derive(Debug, Deserialize)]
pub struct TicketForm {
    pub status: TicketStatus,
    #[serde(default)]
    pub assignee: String,
    #[serde(default)]
    pub response: String,
}

impl TicketForm {
    /// Check the status change against `current` and build the PATCH body.
    ///
    /// # Errors
    ///
    /// Returns the transition error message when the move is not allowed.
    pub fn to_update(&self, current: TicketStatus) -> std::result::Result<TicketUpdate, String> {
        let status = current
            .transition_to(self.status)
            .map_err(|e| e.to_string())?;
        let non_empty = |s: &str| Some(s.trim().to_string()).filter(|s| !s.is_empty());
        Ok(TicketUpdate {
            status,
            assignee: non_empty(&self.assignee),
            response: non_empty(&self.response),
        })
    }
}

/// Ticket queue handler, oldest first.
#[instrument(skip(state, staff))]
pub async fn index(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    Query(query): Query<TicketsQuery>,
) -> Result<Html<String>> {
    let (result, nav) = tokio::join!(
        state.api().tickets(&staff.access_token),
        Nav::new(&state, &staff, "/tickets"),
    );
    let (tickets, error) = or_degrade(result, "support tickets")?;

    let request = PageRequest::new(query.page.unwrap_or(1), state.config().page_size);
    let page = paginate(query.filter().apply(tickets), request);

    let template = TicketsTemplate {
        nav,
        tickets: page.items.iter().map(TicketRow::from).collect(),
        total: page.total_items,
        status_options: TicketStatus::ALL
            .into_iter()
            .map(|s| SelectOption {
                value: s.as_str().to_string(),
                label: s.label().to_string(),
                selected: query.status == Some(s),
            })
            .collect(),
        q: query.q.clone().unwrap_or_default(),
        pager: PagerView::new("/tickets", &query.pairs(), &page),
        error,
    };

    Ok(render(&template))
}

/// Ticket detail handler.
#[instrument(skip(state, staff))]
pub async fn show(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    Path(id): Path<TicketId>,
) -> Result<Html<String>> {
    let ticket = state.api().ticket(&staff.access_token, id).await?;
    let assignee = ticket.assignee.clone().unwrap_or_default();
    let response = ticket.response.clone().unwrap_or_default();
    Ok(render(
        &detail_page(&state, &staff, &ticket, ticket.status, assignee, response, None).await,
    ))
}

/// Ticket update handler.
///
/// The status change is checked against the ticket's current status before
/// anything is sent to the backend.
#[instrument(skip(state, staff, form))]
pub async fn update(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    Path(id): Path<TicketId>,
    Form(form): Form<TicketForm>,
) -> Result<Response> {
    let api = state.api();
    let ticket = api.ticket(&staff.access_token, id).await?;

    let update = match form.to_update(ticket.status) {
        Ok(update) => update,
        Err(message) => return Ok(rejected(&state, &staff, &ticket, form, message).await),
    };

    match api.update_ticket(&staff.access_token, id, &update).await {
        Ok(()) => {
            tracing::info!(
                ticket_id = %id,
                from = %ticket.status,
                to = %update.status,
                staff_id = %staff.id,
                "Ticket updated"
            );
            Ok(Redirect::to(&format!("/tickets/{id}")).into_response())
        }
        Err(ApiError::Rejected(message)) => {
            Ok(rejected(&state, &staff, &ticket, form, message).await)
        }
        Err(e) => Err(e.into()),
    }
}

/// Re-render the detail page with the submitted values and a message.
async fn rejected(
    state: &AppState,
    staff: &CurrentStaff,
    ticket: &SupportTicket,
    form: TicketForm,
    message: String,
) -> Response {
    let page = detail_page(
        state,
        staff,
        ticket,
        form.status,
        form.assignee,
        form.response,
        Some(message),
    )
    .await;
    (StatusCode::UNPROCESSABLE_ENTITY, render(&page)).into_response()
}

async fn detail_page(
    state: &AppState,
    staff: &CurrentStaff,
    ticket: &SupportTicket,
    selected: TicketStatus,
    assignee: String,
    response: String,
    error: Option<String>,
) -> TicketTemplate {
    TicketTemplate {
        nav: Nav::new(state, staff, "/tickets").await,
        ticket: TicketRow::from(ticket),
        message: ticket.message.clone(),
        status_options: TicketStatus::ALL
            .into_iter()
            .filter(|s| ticket.status.can_transition_to(*s))
            .map(|s| SelectOption {
                value: s.as_str().to_string(),
                label: s.label().to_string(),
                selected: s == selected,
            })
            .collect(),
        assignee,
        response,
        error,
    }
}
