//! Access gate for the authenticated shell.
//!
//! The gate is a pure reducer over session, viewer and locale status. Drivers
//! (the page middleware and the client shell) feed it inputs and act on the
//! redirect it hands back.

pub const LOGIN_PATH: &str = "/auth/login";
pub const ONBOARDING_PATH: &str = "/getting-started";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatePhase {
    CheckingSession,
    RedirectLogin,
    CheckingOnboarding,
    RedirectOnboarding,
    Ready,
}

impl GatePhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, GatePhase::RedirectLogin | GatePhase::RedirectOnboarding)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerStatus {
    Pending,
    Onboarded,
    NeedsOnboarding,
    /// Identity fetch gave up after its retries.
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocaleStatus {
    Loading,
    Ready,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateInput {
    pub session_loading: bool,
    pub has_session: bool,
    pub viewer: ViewerStatus,
    pub locale: LocaleStatus,
}

impl GateInput {
    /// Server-side input: the session is already resolved and strings are bundled.
    pub fn resolved(has_session: bool, viewer: ViewerStatus) -> Self {
        Self {
            session_loading: false,
            has_session,
            viewer,
            locale: LocaleStatus::Ready,
        }
    }
}

pub fn reduce(phase: GatePhase, input: &GateInput) -> GatePhase {
    if phase.is_terminal() {
        return phase;
    }

    if !input.has_session {
        return if input.session_loading {
            GatePhase::CheckingSession
        } else {
            GatePhase::RedirectLogin
        };
    }

    match (input.viewer, input.locale) {
        (ViewerStatus::NeedsOnboarding, _) => GatePhase::RedirectOnboarding,
        (ViewerStatus::Onboarded, LocaleStatus::Ready) => GatePhase::Ready,
        _ => GatePhase::CheckingOnboarding,
    }
}

/// Phase reached from a fresh gate in one step.
pub fn settle(input: &GateInput) -> GatePhase {
    reduce(GatePhase::CheckingSession, input)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateView {
    Loading,
    Content,
    /// Retryable error boundary; only reachable once gating has passed.
    Error,
}

pub fn view(phase: GatePhase, input: &GateInput) -> GateView {
    let loading = input.locale == LocaleStatus::Loading
        || phase == GatePhase::RedirectOnboarding
        || (input.session_loading && !input.has_session);
    if loading {
        return GateView::Loading;
    }

    match phase {
        GatePhase::Ready => GateView::Content,
        GatePhase::CheckingOnboarding if input.viewer == ViewerStatus::Failed => GateView::Error,
        _ => GateView::Loading,
    }
}

pub fn login_redirect(path_and_query: &str) -> String {
    format!(
        "{LOGIN_PATH}?callbackUrl={}",
        urlencoding::encode(path_and_query)
    )
}

pub fn redirect_target(phase: GatePhase, route: &str) -> Option<String> {
    match phase {
        GatePhase::RedirectLogin => Some(login_redirect(route)),
        GatePhase::RedirectOnboarding => Some(ONBOARDING_PATH.to_string()),
        _ => None,
    }
}

/// A redirect computed for `route`; stale once the gate has moved on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRedirect {
    pub route: String,
    pub target: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateOutput {
    pub phase: GatePhase,
    pub view: GateView,
    pub redirect: Option<PendingRedirect>,
}

/// Stateful wrapper that issues each redirect at most once per route.
#[derive(Debug, Clone)]
pub struct Gate {
    phase: GatePhase,
    route: String,
    redirect_issued: bool,
}

impl Gate {
    pub fn new(route: &str) -> Self {
        Self {
            phase: GatePhase::CheckingSession,
            route: route.to_string(),
            redirect_issued: false,
        }
    }

    pub fn phase(&self) -> GatePhase {
        self.phase
    }

    pub fn route(&self) -> &str {
        &self.route
    }

    /// Returns whether the route actually changed.
    pub fn navigate(&mut self, route: &str) -> bool {
        if self.route == route {
            return false;
        }
        self.route = route.to_string();
        self.phase = GatePhase::CheckingSession;
        self.redirect_issued = false;
        true
    }

    pub fn update(&mut self, input: &GateInput) -> GateOutput {
        self.phase = reduce(self.phase, input);

        let mut redirect = None;
        if !self.redirect_issued {
            if let Some(target) = redirect_target(self.phase, &self.route) {
                self.redirect_issued = true;
                redirect = Some(PendingRedirect {
                    route: self.route.clone(),
                    target,
                });
            }
        }

        GateOutput {
            phase: self.phase,
            view: view(self.phase, input),
            redirect,
        }
    }

    pub fn is_current(&self, redirect: &PendingRedirect) -> bool {
        redirect.route == self.route
    }
}
