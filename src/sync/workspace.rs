use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::info;
use uuid::Uuid;

use crate::models::{
    default_personas, sample_agreements, sample_documents, sample_projects, Agreement,
    AgreementStatus, Document, Message, Persona, PresenceSignal, Project, StreamItem, User,
};
use super::channel::SyncChannel;
use super::clock::Clock;
use super::coordinator::{SyncCoordinator, SyncHandlers, SyncSettings};
use super::error::SyncError;

/// A user currently shown as typing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresenceEntry {
    pub user_id: String,
    pub display_name: String,
    pub is_typing: bool,
}

/// One context's copy of everything that is synchronized
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkspaceState {
    pub messages: Vec<Message>,
    pub projects: Vec<Project>,
    pub documents: Vec<Document>,
    pub personas: Vec<Persona>,
    pub agreements: Vec<Agreement>,
    pub typers: BTreeMap<String, PresenceEntry>,
}

impl WorkspaceState {
    /// What a fresh workspace starts with: the assistant's greeting, the stock
    /// personas and the sample board, knowledge base and agreements
    pub fn seeded() -> Self {
        Self {
            messages: vec![Message::from_assistant(
                "0",
                "Welcome to Nexus Workspace. I am ready to collaborate with your team. How can I assist you today?",
            )],
            projects: sample_projects(),
            documents: sample_documents(),
            personas: default_personas(),
            agreements: sample_agreements(),
            typers: BTreeMap::new(),
        }
    }

    /// Documents fed to the assistant as context
    pub fn active_documents(&self) -> impl Iterator<Item = &Document> {
        self.documents.iter().filter(|d| d.is_active)
    }

    pub fn active_agreements(&self) -> impl Iterator<Item = &Agreement> {
        self.agreements.iter().filter(|a| a.status == AgreementStatus::Active)
    }

    fn apply_presence(&mut self, user_id: &str, name: &str, is_typing: bool) {
        if is_typing {
            self.typers.insert(user_id.to_string(), PresenceEntry {
                user_id: user_id.to_string(),
                display_name: name.to_string(),
                is_typing,
            });
        } else {
            self.typers.remove(user_id);
        }
    }
}

fn read(state: &RwLock<WorkspaceState>) -> RwLockReadGuard<'_, WorkspaceState> {
    state.read().unwrap_or_else(|e| e.into_inner())
}

fn write(state: &RwLock<WorkspaceState>) -> RwLockWriteGuard<'_, WorkspaceState> {
    state.write().unwrap_or_else(|e| e.into_inner())
}

/// The collections of one running context, kept in sync with its peers.
///
/// Every setter updates the local copy first and then broadcasts the whole
/// collection, so a failed send never loses a local edit.
pub struct Workspace {
    state: Arc<RwLock<WorkspaceState>>,
    user: RwLock<User>,
    coordinator: SyncCoordinator,
}

impl Workspace {
    pub fn attach(
        channel: Arc<dyn SyncChannel>,
        clock: Arc<dyn Clock>,
        settings: SyncSettings,
        user: User,
    ) -> Result<Self, SyncError> {
        Self::with_state(channel, clock, settings, user, WorkspaceState::seeded())
    }

    pub fn with_state(
        channel: Arc<dyn SyncChannel>,
        clock: Arc<dyn Clock>,
        settings: SyncSettings,
        user: User,
        initial: WorkspaceState,
    ) -> Result<Self, SyncError> {
        let state = Arc::new(RwLock::new(initial));

        let handlers = SyncHandlers::new()
            .on_messages({
                let state = state.clone();
                move |messages| write(&state).messages = messages
            })
            .on_projects({
                let state = state.clone();
                move |projects| write(&state).projects = projects
            })
            .on_documents({
                let state = state.clone();
                move |documents| write(&state).documents = documents
            })
            .on_personas({
                let state = state.clone();
                move |personas| write(&state).personas = personas
            })
            .on_agreements({
                let state = state.clone();
                move |agreements| write(&state).agreements = agreements
            })
            .on_presence({
                let state = state.clone();
                move |user_id, name, is_typing| write(&state).apply_presence(user_id, name, is_typing)
            });

        let coordinator = SyncCoordinator::initialize(channel, handlers, clock, settings)?;
        info!("Workspace attached for {}", user.id);

        Ok(Self {
            state,
            user: RwLock::new(user),
            coordinator,
        })
    }

    // The local write happens inside the coordinator's per-stream gate, so a
    // peer update is either applied before it or judged against its stamp.
    // Lock order is gate, then state; replace callbacks take the same order.
    fn set<T: StreamItem>(
        &self,
        field: fn(&mut WorkspaceState) -> &mut Vec<T>,
        f: impl FnOnce(&[T]) -> Vec<T>,
    ) -> i64 {
        self.coordinator.broadcast_with(|| {
            let mut state = write(&self.state);
            let slot = field(&mut state);
            let next = f(slot);
            *slot = next.clone();
            next
        })
    }

    pub fn set_messages(&self, f: impl FnOnce(&[Message]) -> Vec<Message>) -> i64 {
        self.set(|s| &mut s.messages, f)
    }

    pub fn set_projects(&self, f: impl FnOnce(&[Project]) -> Vec<Project>) -> i64 {
        self.set(|s| &mut s.projects, f)
    }

    pub fn set_documents(&self, f: impl FnOnce(&[Document]) -> Vec<Document>) -> i64 {
        self.set(|s| &mut s.documents, f)
    }

    pub fn set_personas(&self, f: impl FnOnce(&[Persona]) -> Vec<Persona>) -> i64 {
        self.set(|s| &mut s.personas, f)
    }

    pub fn set_agreements(&self, f: impl FnOnce(&[Agreement]) -> Vec<Agreement>) -> i64 {
        self.set(|s| &mut s.agreements, f)
    }

    pub fn post_message(&self, message: Message) -> i64 {
        self.set_messages(|prev| {
            let mut next = prev.to_vec();
            next.push(message);
            next
        })
    }

    /// Replace the project sharing `project`'s id
    pub fn update_project(&self, project: Project) -> i64 {
        self.set_projects(|prev| {
            prev.iter()
                .map(|p| if p.id == project.id { project.clone() } else { p.clone() })
                .collect()
        })
    }

    /// Turn an accepted proposal into an active agreement signed by the current user
    pub fn adopt_agreement(&self, title: &str, content: &str) -> Agreement {
        let agreement = Agreement {
            id: Uuid::new_v4().to_string(),
            title: title.to_string(),
            content: content.to_string(),
            status: AgreementStatus::Active,
            created_at: Utc::now(),
            signatories: vec![self.current_user().id],
        };
        let added = agreement.clone();
        self.set_agreements(move |prev| {
            let mut next = prev.to_vec();
            next.push(added);
            next
        });
        agreement
    }

    /// Add the current user to an agreement's signatories. Returns false, without
    /// broadcasting, when the agreement is unknown or already carries their signature.
    pub fn sign_agreement(&self, agreement_id: &str) -> bool {
        let user_id = self.current_user().id;
        let signable = read(&self.state)
            .agreements
            .iter()
            .any(|a| a.id == agreement_id && !a.signatories.contains(&user_id));
        if !signable {
            return false;
        }
        self.set_agreements(|prev| {
            let mut next = prev.to_vec();
            if let Some(agreement) = next.iter_mut().find(|a| a.id == agreement_id) {
                agreement.sign(&user_id);
            }
            next
        });
        true
    }

    pub fn broadcast_typing(&self, is_typing: bool) -> bool {
        let user = self.current_user();
        self.coordinator
            .broadcast_presence(PresenceSignal::new(user.id, user.name, is_typing))
    }

    pub fn switch_user(&self, user: User) {
        info!("Switching workspace user to {}", user.id);
        *self.user.write().unwrap_or_else(|e| e.into_inner()) = user;
    }

    pub fn current_user(&self) -> User {
        self.user.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn snapshot(&self) -> WorkspaceState {
        read(&self.state).clone()
    }

    pub fn active_typers(&self) -> Vec<PresenceEntry> {
        read(&self.state).typers.values().cloned().collect()
    }

    pub fn coordinator(&self) -> &SyncCoordinator {
        &self.coordinator
    }

    pub fn teardown(&self) {
        self.coordinator.teardown();
    }
}
