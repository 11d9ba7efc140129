//! Typed navigation contract between sandboxed snippet content and the host.
//!
//! Embedded content never reaches into host state. It sends a JSON message,
//! the host answers with another one, and any navigation is returned to the
//! caller as an explicit intent.

use crate::widget::{Page, PageSummary};
use log::debug;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum NavRequest {
    Navigate { page_id: Uuid },
    ListPages { request_id: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum NavResponse {
    Pages {
        request_id: String,
        pages: Vec<PageSummary>,
    },
    Navigated {
        page_id: Uuid,
    },
    Rejected {
        reason: String,
    },
}

/// Which pages sandboxed content may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageVisibility {
    /// Visitors of the public site.
    PublicOnly,
    /// The administrator's editor.
    All,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavOutcome {
    pub reply: NavResponse,
    /// Set when the host should switch to this page.
    pub navigate_to: Option<Uuid>,
}

#[derive(Debug, Clone)]
pub struct NavBridge {
    visibility: PageVisibility,
    pages: Vec<PageSummary>,
}

impl NavBridge {
    pub fn new(pages: &[Page], visibility: PageVisibility) -> Self {
        let mut bridge = Self {
            visibility,
            pages: Vec::new(),
        };
        bridge.refresh(pages);
        bridge
    }

    /// Rebuilds the reachable page list, sorted by name.
    pub fn refresh(&mut self, pages: &[Page]) {
        let visibility = self.visibility;
        self.pages = pages
            .iter()
            .filter(|p| visibility == PageVisibility::All || p.is_public)
            .map(Page::summary)
            .collect();
        self.pages.sort_by(|a, b| a.name.cmp(&b.name));
    }

    pub fn pages(&self) -> &[PageSummary] {
        &self.pages
    }

    pub fn handle(&self, request: NavRequest) -> NavOutcome {
        match request {
            NavRequest::ListPages { request_id } => NavOutcome {
                reply: NavResponse::Pages {
                    request_id,
                    pages: self.pages.clone(),
                },
                navigate_to: None,
            },
            NavRequest::Navigate { page_id } => {
                if self.pages.iter().any(|p| p.id == page_id) {
                    debug!("navigation to {} accepted", page_id);
                    NavOutcome {
                        reply: NavResponse::Navigated { page_id },
                        navigate_to: Some(page_id),
                    }
                } else {
                    rejected(format!("page {page_id} is not available"))
                }
            }
        }
    }

    /// Handles a raw JSON message. Malformed input is answered with `rejected`.
    pub fn handle_message(&self, raw: &str) -> NavOutcome {
        match serde_json::from_str::<NavRequest>(raw) {
            Ok(request) => self.handle(request),
            Err(err) => rejected(format!("malformed message: {err}")),
        }
    }
}

fn rejected(reason: String) -> NavOutcome {
    debug!("navigation message rejected: {}", reason);
    NavOutcome {
        reply: NavResponse::Rejected { reason },
        navigate_to: None,
    }
}
