use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use launchpad_core::Notifier;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::backend::BackendError;
use crate::balance::{BalanceOracle, WalletProbe};
use crate::credentials::{AwsCredential, CredentialKind, CredentialStore, RegionLister, regions_for_credential};
use crate::fields::{FieldUpdate, Variant};
use crate::poller::{PollCallbacks, PollPolicy, Subscription, TaskPoller};
use crate::state::WizardState;
use crate::submitter::{DeploymentSubmitter, JobHandle, SubmissionError};
use crate::validation::FieldError;

/// Result of [`WizardController::submit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Not on the final step, fields invalid, or a submission already running.
    Ignored,
    Succeeded(JobHandle),
    Failed(SubmissionError),
    /// The wizard was reset while the request was in flight; the result was
    /// dropped without touching the new state.
    Discarded,
}

/// Clears the in-flight flag even if the submit future is dropped.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Drives the DRB deployment wizard.
///
/// Owns the [`WizardState`] and wires it to validation, the wallet probe and
/// submission. Synchronous transitions run under a single lock; `submit` is
/// serialized by an in-flight flag.
pub struct WizardController {
    state: Mutex<WizardState>,
    /// Bumped by `reset`. Async results carry the session they started in.
    session: AtomicU64,
    submitting: AtomicBool,
    submitter: DeploymentSubmitter,
    oracle: BalanceOracle,
    notifier: Arc<dyn Notifier>,
    resource_id: Option<String>,
    credentials: Option<(Arc<dyn CredentialStore>, Arc<dyn RegionLister>)>,
    subscriptions: Mutex<Vec<Subscription>>,
}

impl WizardController {
    pub fn new(submitter: DeploymentSubmitter, oracle: BalanceOracle, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            state: Mutex::new(WizardState::new()),
            session: AtomicU64::new(0),
            submitting: AtomicBool::new(false),
            submitter,
            oracle,
            notifier,
            resource_id: None,
            credentials: None,
            subscriptions: Mutex::new(Vec::new()),
        }
    }

    /// Deploy into `resource_id` instead of the backend's default resource.
    pub fn with_resource(mut self, resource_id: impl Into<String>) -> Self {
        self.resource_id = Some(resource_id.into());
        self
    }

    pub fn with_credentials(mut self, store: Arc<dyn CredentialStore>, regions: Arc<dyn RegionLister>) -> Self {
        self.credentials = Some((store, regions));
        self
    }

    // -- Queries ------------------------------------------------------------

    pub fn state(&self) -> WizardState {
        self.state.lock().clone()
    }

    pub fn can_continue(&self) -> bool {
        let state = self.state.lock();
        !state.is_busy() && state.can_advance()
    }

    pub fn field_errors(&self) -> Vec<FieldError> {
        self.state.lock().current_errors()
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting.load(Ordering::SeqCst)
    }

    pub fn wallet_probe(&self) -> Option<WalletProbe> {
        self.oracle.probe()
    }

    pub fn is_probing(&self) -> bool {
        self.oracle.is_loading()
    }

    /// Advisory low-balance warning for the config step.
    pub fn insufficient_balance(&self) -> bool {
        self.oracle.insufficient_balance()
    }

    // -- Transitions --------------------------------------------------------

    pub fn set_variant(&self, variant: Variant) -> bool {
        self.state.lock().set_variant(variant)
    }

    /// Apply a form edit. Edits to the key or network re-run the wallet probe.
    pub fn set_field(&self, update: FieldUpdate) -> bool {
        let refresh = update.affects_probe();
        let probe_input = {
            let mut state = self.state.lock();
            if !state.set_field(update) {
                return false;
            }
            let network = &state.fields.network;
            refresh.then(|| {
                (
                    state.fields.config.private_key.clone(),
                    network.resolved_rpc_url(),
                    network.native_token(),
                )
            })
        };
        if let Some((key, rpc_url, token)) = probe_input {
            self.oracle.update(&key, rpc_url.as_deref(), token);
        }
        true
    }

    pub fn go_next(&self) -> bool {
        let mut state = self.state.lock();
        let from = state.step;
        let moved = state.advance_step();
        if moved {
            info!(from = from.key(), to = state.step.key(), "wizard advanced");
        }
        moved
    }

    pub fn go_back(&self) -> bool {
        let mut state = self.state.lock();
        let from = state.step;
        let moved = state.go_back();
        if moved {
            info!(from = from.key(), to = state.step.key(), "wizard went back");
        }
        moved
    }

    pub fn retry(&self) -> bool {
        self.state.lock().retry()
    }

    /// Submit the deployment from the final data-entry step.
    pub async fn submit(&self) -> SubmitOutcome {
        if self.submitting.swap(true, Ordering::SeqCst) {
            debug!("submit ignored: already in flight");
            return SubmitOutcome::Ignored;
        }
        let _in_flight = InFlight(&self.submitting);

        let session = self.session.load(Ordering::SeqCst);
        let (fields, variant) = {
            let mut state = self.state.lock();
            if !state.begin_submit() {
                return SubmitOutcome::Ignored;
            }
            (state.fields.clone(), state.variant)
        };

        // Every reachable step, not just the one on screen.
        if let Err(err) = DeploymentSubmitter::validate(variant, &fields) {
            return self.finish_submit(session, Err(err));
        }
        {
            let mut state = self.state.lock();
            if self.session.load(Ordering::SeqCst) == session {
                state.mark_submitting();
            }
        }

        let result = self
            .submitter
            .submit(&fields, variant, self.resource_id.as_deref())
            .await;
        self.finish_submit(session, result)
    }

    fn finish_submit(&self, session: u64, result: Result<JobHandle, SubmissionError>) -> SubmitOutcome {
        let mut state = self.state.lock();
        if self.session.load(Ordering::SeqCst) != session {
            info!("discarding submission result from a reset wizard");
            return SubmitOutcome::Discarded;
        }
        match result {
            Ok(handle) => {
                state.complete_submit();
                drop(state);
                info!(variant = %handle.variant, resource_id = %handle.resource_id, "DRB deployment submitted");
                self.notifier.success(
                    "Deployment started",
                    &format!("{} deployment is in progress", handle.variant),
                );
                SubmitOutcome::Succeeded(handle)
            }
            Err(err) => {
                let message = err.user_message();
                state.fail_submit(message.clone());
                drop(state);
                warn!(error = %err, "DRB deployment failed");
                self.notifier.error("Deployment failed", &message);
                SubmitOutcome::Failed(err)
            }
        }
    }

    /// Back to the first step with default fields. Drops the wallet probe,
    /// which belonged to the old key. A submission still in flight will not
    /// touch the fresh state.
    pub fn reset(&self) {
        self.session.fetch_add(1, Ordering::SeqCst);
        self.state.lock().reset();
        self.oracle.clear();
        debug!("wizard reset");
    }

    /// Dialog closed: reset and stop any job polling.
    pub fn close(&self) {
        self.reset();
        let subscriptions = std::mem::take(&mut *self.subscriptions.lock());
        for subscription in &subscriptions {
            subscription.cancel();
        }
    }

    // -- Job tracking -------------------------------------------------------

    /// Poll the job behind an accepted submission, reporting the outcome
    /// through the notifier. Returns `false` when there is no job to follow.
    pub fn track_job(&self, poller: &TaskPoller, handle: &JobHandle, policy: PollPolicy) -> bool {
        let Some(job_id) = handle.job_id.clone() else {
            return false;
        };
        let on_done = Arc::clone(&self.notifier);
        let on_fail = Arc::clone(&self.notifier);
        let callbacks = PollCallbacks::new()
            .on_complete(move |progress| {
                on_done.success("Deployment complete", &format!("Job {} finished", progress.job_id));
            })
            .on_error(move |progress| {
                let reason = progress
                    .last_error
                    .clone()
                    .filter(|m| !m.is_empty())
                    .or_else(|| Some(progress.message.clone()).filter(|m| !m.is_empty()))
                    .unwrap_or_else(|| format!("Job {} failed", progress.job_id));
                on_fail.error("Deployment failed", &reason);
            });
        self.attach_subscription(poller.start(job_id, policy, callbacks));
        true
    }

    /// Keep `subscription` alive until the wizard is closed.
    pub fn attach_subscription(&self, subscription: Subscription) {
        let mut subscriptions = self.subscriptions.lock();
        subscriptions.retain(Subscription::is_active);
        subscriptions.push(subscription);
    }

    pub fn active_subscriptions(&self) -> usize {
        self.subscriptions.lock().iter().filter(|s| s.is_active()).count()
    }

    // -- AWS lookups ----------------------------------------------------------

    pub async fn aws_credentials(&self) -> Result<Vec<AwsCredential>, BackendError> {
        let Some((store, _)) = &self.credentials else {
            return Ok(Vec::new());
        };
        store.list_credentials(CredentialKind::Aws).await
    }

    /// Regions for the credential selected on the `aws` step. Empty until a
    /// credential is chosen.
    pub async fn available_regions(&self) -> Result<Vec<String>, BackendError> {
        let Some((store, lister)) = &self.credentials else {
            return Ok(Vec::new());
        };
        let credential_id = self.state.lock().fields.aws.credential_id.trim().to_string();
        if credential_id.is_empty() {
            return Ok(Vec::new());
        }
        regions_for_credential(store.as_ref(), lister.as_ref(), &credential_id).await
    }
}
