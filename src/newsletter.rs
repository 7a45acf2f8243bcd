//! Newsletter subscription flow.
//!
//! [`NewsletterForm::submit`] is the whole controller: it takes the raw form
//! values, decides whether a request may be sent, sends at most one, and
//! reports back through a [`FormView`]. The view is a thin adapter (DOM,
//! terminal, test recorder) and owns presentation details such as the
//! auto-dismiss timer.
//!
//! ## Checks, in order
//!
//! 1. **Validation**: the trimmed address must look like `local@domain.tld`.
//! 2. **Rate limit**: after [`RATE_LIMIT_MAX`] successful submissions, another
//!    one is refused while the last success is less than
//!    [`RATE_LIMIT_WINDOW`] old. The counter is cumulative for the lifetime of
//!    the form and is never decayed; only the look-back is time based.
//! 3. **Honeypot**: a filled-in hidden field means a bot. The visitor sees a
//!    generic error and nothing is sent.
//!
//! None of the three make a network call. Counters only move on success.

use crate::logger::Logger;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Endpoint path, relative to the site origin.
pub const SUBSCRIBE_PATH: &str = "/api/newsletter/subscribe";
/// Value of the `source` field in every request.
pub const SOURCE_TAG: &str = "website";
/// Successful submissions allowed before the look-back applies.
pub const RATE_LIMIT_MAX: u32 = 3;
pub const RATE_LIMIT_WINDOW: Duration = Duration::from_secs(60);
/// How long feedback stays on screen.
pub const MESSAGE_TTL: Duration = Duration::from_secs(5);
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

pub const MSG_INVALID_EMAIL: &str = "Por favor, ingresa un correo electrónico válido.";
pub const MSG_RATE_LIMITED: &str = "Demasiados intentos. Por favor, espera un minuto.";
pub const MSG_REJECTED: &str = "Error al procesar la solicitud.";
pub const MSG_FAILED: &str = "Ocurrió un error. Por favor, intenta de nuevo.";
pub const MSG_SUBSCRIBED: &str = "¡Suscripción exitosa! Revisa tu correo para confirmar.";

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server answered with status {0}")]
    Status(u16),
    #[error("response body is not JSON: {0}")]
    Decode(#[source] reqwest::Error),
}

#[derive(Error, Debug)]
pub enum SubmitError {
    #[error("invalid email address: {0:?}")]
    Validation(String),
    #[error("rate limited after {count} submissions")]
    RateLimited { count: u32 },
    #[error("honeypot field was filled in")]
    BotDetected,
    #[error("subscription request failed: {0}")]
    Submission(#[from] TransportError),
}

impl SubmitError {
    /// What the visitor is told.
    pub fn user_message(&self) -> &'static str {
        match self {
            SubmitError::Validation(_) => MSG_INVALID_EMAIL,
            SubmitError::RateLimited { .. } => MSG_RATE_LIMITED,
            SubmitError::BotDetected => MSG_REJECTED,
            SubmitError::Submission(_) => MSG_FAILED,
        }
    }
}

/// JSON body of the subscription request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscribeRequest {
    pub email: String,
    pub source: String,
}

impl SubscribeRequest {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            source: SOURCE_TAG.to_string(),
        }
    }
}

/// Performs the one outbound call of a submission.
pub trait Transport {
    /// Send `request`; any non-2xx answer or non-JSON body is an error.
    fn subscribe(&mut self, request: &SubscribeRequest)
    -> Result<serde_json::Value, TransportError>;
}

/// [`Transport`] over HTTP with reqwest's blocking client.
pub struct HttpTransport {
    client: reqwest::blocking::Client,
    endpoint: String,
}

impl HttpTransport {
    /// Transport posting to `<base_url>/api/newsletter/subscribe`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            endpoint: format!("{}{}", base_url.trim_end_matches('/'), SUBSCRIBE_PATH),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Transport for HttpTransport {
    fn subscribe(
        &mut self,
        request: &SubscribeRequest,
    ) -> Result<serde_json::Value, TransportError> {
        let response = self.client.post(&self.endpoint).json(request).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }
        response.json().map_err(TransportError::Decode)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Success,
    Error,
}

/// State of the submit button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitControl {
    /// Enabled, labelled "Suscribirme".
    Ready,
    /// Disabled with a spinner while the request is in flight.
    Busy,
}

impl SubmitControl {
    pub fn label(self) -> &'static str {
        match self {
            SubmitControl::Ready => "Suscribirme",
            SubmitControl::Busy => "Procesando...",
        }
    }

    pub fn enabled(self) -> bool {
        matches!(self, SubmitControl::Ready)
    }
}

/// The UI side of the form.
pub trait FormView {
    /// Show feedback that the view hides again after `dismiss_after`.
    fn show_message(&mut self, text: &str, kind: MessageKind, dismiss_after: Duration);
    fn clear_input(&mut self);
    fn set_submit_control(&mut self, control: SubmitControl);
}

/// Re-enables the submit control when dropped, whatever happened meanwhile.
struct BusyGuard<'a, V: FormView + ?Sized> {
    view: &'a mut V,
}

impl<'a, V: FormView + ?Sized> BusyGuard<'a, V> {
    fn engage(view: &'a mut V) -> Self {
        view.set_submit_control(SubmitControl::Busy);
        Self { view }
    }
}

impl<V: FormView + ?Sized> Drop for BusyGuard<'_, V> {
    fn drop(&mut self) {
        self.view.set_submit_control(SubmitControl::Ready);
    }
}

pub trait Clock {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Per-form counters. Never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubmissionState {
    pub submission_count: u32,
    pub last_submission: Option<Instant>,
}

impl SubmissionState {
    pub fn is_rate_limited(&self, now: Instant) -> bool {
        let recent = self
            .last_submission
            .is_some_and(|last| now.duration_since(last) < RATE_LIMIT_WINDOW);
        recent && self.submission_count >= RATE_LIMIT_MAX
    }
}

/// A request the server accepted.
#[derive(Debug, Clone, PartialEq)]
pub struct Subscription {
    pub email: String,
    pub response: serde_json::Value,
}

/// Email shape check: one `@`, a non-empty local part, and a domain with a
/// dot that has text on both sides. Whitespace anywhere is rejected.
pub fn validate_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

/// Strip characters that could smuggle markup into downstream templates.
pub fn sanitize_input(input: &str) -> String {
    input
        .trim()
        .chars()
        .filter(|c| !matches!(c, '<' | '>' | '"' | '\'' | '&'))
        .collect()
}

pub struct NewsletterForm<T, L, C = SystemClock> {
    transport: T,
    logger: L,
    clock: C,
    state: SubmissionState,
}

impl<T: Transport, L: Logger> NewsletterForm<T, L, SystemClock> {
    pub fn new(transport: T, logger: L) -> Self {
        Self::with_clock(transport, logger, SystemClock)
    }
}

impl<T: Transport, L: Logger, C: Clock> NewsletterForm<T, L, C> {
    pub fn with_clock(transport: T, logger: L, clock: C) -> Self {
        Self {
            transport,
            logger,
            clock,
            state: SubmissionState::default(),
        }
    }

    pub fn state(&self) -> SubmissionState {
        self.state
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Handle one submit of the form.
    ///
    /// Every outcome shows exactly one message on `view`. The submit control
    /// is busy only while the request is in flight and is always restored.
    pub fn submit<V: FormView + ?Sized>(
        &mut self,
        email_raw: &str,
        honeypot: &str,
        view: &mut V,
    ) -> Result<Subscription, SubmitError> {
        match self.attempt(email_raw, honeypot, view) {
            Ok(subscription) => {
                view.show_message(MSG_SUBSCRIBED, MessageKind::Success, MESSAGE_TTL);
                view.clear_input();
                Ok(subscription)
            }
            Err(err) => {
                view.show_message(err.user_message(), MessageKind::Error, MESSAGE_TTL);
                Err(err)
            }
        }
    }

    fn attempt<V: FormView + ?Sized>(
        &mut self,
        email_raw: &str,
        honeypot: &str,
        view: &mut V,
    ) -> Result<Subscription, SubmitError> {
        let email = email_raw.trim();
        if !validate_email(email) {
            return Err(SubmitError::Validation(email.to_string()));
        }

        let now = self.clock.now();
        if self.state.is_rate_limited(now) {
            return Err(SubmitError::RateLimited {
                count: self.state.submission_count,
            });
        }

        if !honeypot.is_empty() {
            self.logger.warn("Honeypot triggered");
            return Err(SubmitError::BotDetected);
        }

        let request = SubscribeRequest::new(sanitize_input(email));
        let sent = {
            let _busy = BusyGuard::engage(view);
            self.transport.subscribe(&request)
        };

        match sent {
            Ok(response) => {
                self.logger
                    .info(&format!("Newsletter subscription successful: {email}"));
                self.state.submission_count += 1;
                self.state.last_submission = Some(now);
                Ok(Subscription {
                    email: request.email,
                    response,
                })
            }
            Err(err) => {
                self.logger
                    .error("Newsletter subscription failed", Some(&err));
                Err(SubmitError::Submission(err))
            }
        }
    }
}
