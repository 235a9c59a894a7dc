mod companies;
mod dashboard;
mod events;
mod reports;
mod settings;

pub use companies::CompaniesView;
pub use dashboard::DashboardView;
pub use events::EventsView;
pub use reports::ReportsView;
pub use settings::SettingsView;

use std::sync::Arc;
use tokio::sync::mpsc;

use crate::api::CachedBackend;
use crate::config::Config;
use crate::event::{Event, Notice};
use crate::jobs::{JobAck, JobCoordinator, JobError, JobRequest};
use crate::ui::view::View;

/// Shared handles every view is built from
#[derive(Clone)]
pub struct ViewContext {
  pub backend: CachedBackend,
  pub config: Arc<Config>,
  pub tx: mpsc::UnboundedSender<Event>,
}

/// Build the root view for a command name
pub fn open(name: &str, ctx: &ViewContext) -> Option<Box<dyn View>> {
  let view: Box<dyn View> = match name {
    "dashboard" => Box::new(DashboardView::new(ctx.clone())),
    "companies" => Box::new(CompaniesView::new(ctx.clone())),
    "events" => Box::new(EventsView::new(ctx.clone())),
    "reports" => Box::new(ReportsView::new(ctx.clone())),
    "settings" => Box::new(SettingsView::new(ctx.clone())),
    _ => return None,
  };
  Some(view)
}

/// Trigger `request` in the background and report the outcome on the status bar.
///
/// Nothing is reported once the coordinator is disposed, since the view that
/// asked is gone.
pub(crate) fn spawn_job<F>(
  jobs: &JobCoordinator,
  request: JobRequest,
  tx: mpsc::UnboundedSender<Event>,
  on_ack: F,
) where
  F: FnOnce(&JobAck) -> Notice + Send + 'static,
{
  let jobs = jobs.clone();
  tokio::spawn(async move {
    let notice = match jobs.trigger(request).await {
      Ok(ack) => on_ack(&ack),
      Err(JobError::Disposed) => return,
      Err(e) => Notice::error(e.to_string()),
    };
    let _ = tx.send(Event::Notice(notice));
  });
}

/// Notice for a job view asked to run without a GUID
pub(crate) fn missing_guid() -> Notice {
  Notice::error("Enter a company GUID first")
}
