use std::sync::Arc;

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use clap::Parser;
use client_core::{
    ActionOutcome, CapabilitySet, ColumnSpec, ConfirmationModal, Decision, Feedback,
    FeedbackEvent, Filters, FormController, FormSchema, HttpResourceClient, ListActionController,
    LoadOutcome, ModalOutcome, Navigator, Resource, ResourceClient, Route, SaveOutcome,
    TableState,
};
use shared::domain::{ActionType, Record, RecordId};
use tokio::sync::broadcast;

mod commands;
mod config;
mod render;

use commands::{
    ActionItemCommand, Cli, Command, DecisionArgs, RevRequestCommand, VisualTestCommand,
};

const VISUAL_TEST_LIST_ROUTE: &str = "/calibration/visual-tests";
const ACTION_ITEM_DETAIL_ROUTE: &str = "/actionitem/details/{id}";
const REVISION_DETAIL_ROUTE: &str = "/calibration/revision-requests/{id}";

/// Prints where the screen would go next.
struct ConsoleNavigator;

#[async_trait]
impl Navigator for ConsoleNavigator {
    async fn navigate(&self, route: Route) {
        println!("-> {route}");
    }
}

struct Session {
    client: Arc<dyn ResourceClient>,
    feedback: Feedback,
    events: broadcast::Receiver<FeedbackEvent>,
    caps: CapabilitySet,
    settings: client_core::ClientSettings,
}

impl Session {
    fn flush_feedback(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            println!("{}", render::feedback_line(&event));
        }
    }

    fn table(&self, resource: &Resource, detail_route: &str) -> Arc<TableState> {
        Arc::new(TableState::new(
            resource.id_field.clone(),
            Arc::new(ConsoleNavigator),
            detail_route,
        ))
    }

    fn list_controller(
        &self,
        resource: Resource,
        table: Arc<TableState>,
    ) -> Arc<ListActionController> {
        Arc::new(ListActionController::new(
            Arc::clone(&self.client),
            resource,
            table,
            self.feedback.clone(),
        ))
    }

    async fn list(
        &mut self,
        resource: Resource,
        columns: Vec<ColumnSpec>,
        status: Option<String>,
    ) -> Result<()> {
        let table = self.table(&resource, "/");
        let controller = self.list_controller(resource, table.clone());
        let filters: Filters = status.into_iter().map(|s| ("status".to_string(), s)).collect();
        let result = controller.refresh(&filters).await;
        self.flush_feedback();
        result.map_err(|err| anyhow!(err.user_message()))?;
        println!(
            "{}",
            render::render_table(&columns, &self.caps, &table.rows().await)
        );
        Ok(())
    }

    /// Lists the resource and picks the row; falls back to a bare id row when
    /// the listing does not contain it. A failed listing is already reported
    /// through feedback and also falls back, leaving the backend to judge the id.
    async fn find_or_bare(
        &mut self,
        table: &TableState,
        controller: &ListActionController,
        id: &RecordId,
    ) -> Record {
        if let Err(err) = controller.refresh(&Filters::new()).await {
            tracing::debug!(error = %err.user_message(), %id, "listing failed, acting on bare id");
        }
        self.flush_feedback();
        match table.find(id).await {
            Some(row) => row,
            None => Record::new().with(controller.resource().id_field.clone(), id.clone()),
        }
    }

    async fn row_action(
        &mut self,
        resource: Resource,
        detail_route: &str,
        id: String,
        action: ActionType,
    ) -> Result<()> {
        let table = self.table(&resource, detail_route);
        let controller = self.list_controller(resource, table.clone());
        let id = RecordId::new(id);
        let row = self.find_or_bare(&table, &controller, &id).await;
        let outcome = controller.run_action(&row, action, Record::new()).await;
        self.flush_feedback();
        match outcome {
            ActionOutcome::Completed(_) => Ok(()),
            other => bail!("{action} on {id} did not complete: {other:?}"),
        }
    }

    async fn decide(&mut self, args: DecisionArgs, decision: Decision) -> Result<()> {
        let resource = Resource::revision_request();
        let table = self.table(&resource, REVISION_DETAIL_ROUTE);
        let controller = self.list_controller(resource, table.clone());
        let id = RecordId::new(args.id);
        let row = self.find_or_bare(&table, &controller, &id).await;

        let modal = ConfirmationModal::new(controller);
        modal.open(row).await;
        modal.set_reason(args.reason).await;
        modal.set_remark(args.remark).await;
        let outcome = modal.submit(decision).await;
        self.flush_feedback();
        match outcome {
            ModalOutcome::Action(ActionOutcome::Completed(_)) => Ok(()),
            other => bail!("{decision:?} on {id} did not complete: {other:?}"),
        }
    }

    fn form(&self) -> FormController {
        FormController::new(
            Arc::clone(&self.client),
            FormSchema::visual_test(),
            self.feedback.clone(),
            Arc::new(ConsoleNavigator),
            Route::new(VISUAL_TEST_LIST_ROUTE),
            self.settings.success_delay(),
        )
    }

    async fn save_visual_test(&mut self, id: Option<String>, description: String) -> Result<()> {
        let form = self.form();
        if let Some(id) = id {
            let loaded = form.load(RecordId::new(id)).await;
            self.flush_feedback();
            match loaded {
                LoadOutcome::Loaded(_) => {}
                LoadOutcome::Failed(err) => bail!(err.user_message()),
                LoadOutcome::Busy => bail!("visual test form is busy"),
            }
        }
        form.set_field("description", description).await;
        let outcome = form.save().await;
        self.flush_feedback();
        match outcome {
            SaveOutcome::Saved => Ok(()),
            other => bail!("visual test not saved: {other:?}"),
        }
    }

    async fn show_visual_test(&mut self, id: String) -> Result<()> {
        let form = self.form();
        let loaded = form.load(RecordId::new(id)).await;
        self.flush_feedback();
        match loaded {
            LoadOutcome::Loaded(record) => {
                println!("{}", serde_json::to_string_pretty(&record)?);
                Ok(())
            }
            LoadOutcome::Failed(err) => bail!(err.user_message()),
            LoadOutcome::Busy => bail!("visual test form is busy"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = config::load_settings(&cli.config)?;
    let client = HttpResourceClient::new(&settings)?;
    let feedback = Feedback::new();
    let mut session = Session {
        client: Arc::new(client),
        events: feedback.subscribe(),
        feedback,
        caps: CapabilitySet::from_codes(cli.permissions),
        settings,
    };

    match cli.command {
        Command::VisualTest(cmd) => match cmd {
            VisualTestCommand::List => {
                session
                    .list(Resource::visual_test(), render::visual_test_columns(), None)
                    .await
            }
            VisualTestCommand::Show { id } => session.show_visual_test(id).await,
            VisualTestCommand::Add { description } => {
                session.save_visual_test(None, description).await
            }
            VisualTestCommand::Edit { id, description } => {
                session.save_visual_test(Some(id), description).await
            }
        },
        Command::ActionItem(cmd) => match cmd {
            ActionItemCommand::List { status } => {
                session
                    .list(Resource::action_item(), render::action_item_columns(), status)
                    .await
            }
            ActionItemCommand::Accept { id } => {
                session
                    .row_action(
                        Resource::action_item(),
                        ACTION_ITEM_DETAIL_ROUTE,
                        id,
                        ActionType::Accept,
                    )
                    .await
            }
            ActionItemCommand::Assign { id } => {
                session
                    .row_action(
                        Resource::action_item(),
                        ACTION_ITEM_DETAIL_ROUTE,
                        id,
                        ActionType::Assign,
                    )
                    .await
            }
        },
        Command::RevRequest(cmd) => match cmd {
            RevRequestCommand::List { status } => {
                session
                    .list(
                        Resource::revision_request(),
                        render::revision_request_columns(),
                        status,
                    )
                    .await
            }
            RevRequestCommand::Approve(args) => session.decide(args, Decision::Approve).await,
            RevRequestCommand::Reject(args) => session.decide(args, Decision::Reject).await,
        },
    }
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
