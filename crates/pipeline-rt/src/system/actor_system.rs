//! The actor system (spec §4.3): spawn/stop/lookup/watch over a
//! path-keyed registry, the per-actor receive loop, and supervised
//! restart wired through [`crate::supervisor::Supervisor`].

// Layer 1: Standard library imports
use std::sync::{Arc, Weak};

// Layer 2: Third-party crate imports
use dashmap::DashMap;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

// Layer 3: Internal module imports
use crate::actor::{Actor, ActorContext, ActorRef, Props, SupervisionConfig};
use crate::dispatcher::{Dispatcher, Task};
use crate::supervisor::{Supervisor, SupervisionDecision};
use crate::system::{SystemConfig, SystemError};
use pipeline_contracts::{Attr, Checkpointer, Logger, NullCheckpointer, TracingLogger};
use pipeline_core::{ActorPath, LifecycleEvent, Mailbox, Message, MessageKind};

struct ActorHandle {
    mailbox: Arc<Mailbox<Message>>,
    task: JoinHandle<()>,
    parent: Option<ActorPath>,
    props: Props,
}

/// The owning runtime for a tree of actors.
///
/// Holds itself behind `Arc::new_cyclic` so spawned actors' `ActorContext`
/// can carry a strong `Arc<ActorSystem>` while `ActorRef`s handed to peers
/// only ever see a `Weak` one (spec §3).
pub struct ActorSystem {
    config: SystemConfig,
    dispatcher: Arc<Dispatcher>,
    registry: DashMap<ActorPath, ActorHandle>,
    supervisors: DashMap<ActorPath, Arc<Supervisor>>,
    watchers: DashMap<ActorPath, Vec<ActorPath>>,
    logger: Arc<dyn Logger>,
    checkpointer: Arc<dyn Checkpointer>,
    cancellation: CancellationToken,
    self_weak: Weak<ActorSystem>,
}

impl ActorSystem {
    /// Builds a system with the default `tracing`-backed logger and an
    /// in-memory checkpoint store.
    pub fn new(config: SystemConfig) -> Arc<Self> {
        Self::with_dependencies(config, Arc::new(TracingLogger), Arc::new(NullCheckpointer::new()))
    }

    /// Builds a system with explicit `Logger`/`Checkpointer` implementations.
    pub fn with_dependencies(config: SystemConfig, logger: Arc<dyn Logger>, checkpointer: Arc<dyn Checkpointer>) -> Arc<Self> {
        let dispatcher = Arc::new(Dispatcher::new(config.worker_threads));
        Arc::new_cyclic(|weak| Self {
            config,
            dispatcher,
            registry: DashMap::new(),
            supervisors: DashMap::new(),
            watchers: DashMap::new(),
            logger,
            checkpointer,
            cancellation: CancellationToken::new(),
            self_weak: weak.clone(),
        })
    }

    /// Starts the dispatcher's worker pool (spec §4.2's `Start(n)`).
    pub async fn start(&self) {
        self.dispatcher.start(self.config.worker_threads).await;
    }

    /// The number of currently registered actors.
    pub fn actor_count(&self) -> usize {
        self.registry.len()
    }

    /// The configured logger.
    pub fn logger(&self) -> &Arc<dyn Logger> {
        &self.logger
    }

    /// A token cancelled once [`ActorSystem::shutdown`] begins.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Configures (or replaces) the supervisor governing `parent`'s
    /// children. Children spawned under `parent` before this call are
    /// governed by the default [`SupervisionConfig`] until this is called;
    /// calling it again resets restart history for that parent's children.
    pub fn configure_supervisor(&self, parent: &ActorPath, config: SupervisionConfig) {
        self.supervisors.insert(parent.clone(), Arc::new(Supervisor::new(config)));
    }

    fn supervisor_for(&self, parent: &ActorPath) -> Arc<Supervisor> {
        self.supervisors
            .entry(parent.clone())
            .or_insert_with(|| Arc::new(Supervisor::new(SupervisionConfig::default())))
            .clone()
    }

    fn arc(&self) -> Arc<Self> {
        self.self_weak
            .upgrade()
            .unwrap_or_else(|| unreachable!("a live &self implies a live owning Arc<ActorSystem>"))
    }

    /// Looks up a live reference by path.
    pub fn lookup(&self, path: &ActorPath) -> Option<ActorRef> {
        self.registry.get(path).map(|handle| ActorRef::new(path.clone(), &handle.mailbox, &self.arc()))
    }

    /// Snapshots the references of `path`'s direct children.
    pub fn children(&self, path: &ActorPath) -> Vec<ActorRef> {
        let system = self.arc();
        self.registry
            .iter()
            .filter(|entry| entry.value().parent.as_ref() == Some(path))
            .map(|entry| ActorRef::new(entry.key().clone(), &entry.value().mailbox, &system))
            .collect()
    }

    /// Spawns a new actor under `parent` (absent for a root actor).
    pub fn spawn(&self, props: Props, parent: Option<ActorPath>) -> Result<ActorRef, SystemError> {
        self.spawn_inner(props, parent, None, None)
    }

    fn spawn_inner(
        &self,
        props: Props,
        parent: Option<ActorPath>,
        forced_path: Option<ActorPath>,
        restart_cause: Option<String>,
    ) -> Result<ActorRef, SystemError> {
        if self.cancellation.is_cancelled() {
            return Err(SystemError::ShuttingDown);
        }

        let path = forced_path.unwrap_or_else(|| match &parent {
            Some(p) => p.child(&props.name),
            None => ActorPath::root(&props.name),
        });

        if self.registry.contains_key(&path) {
            return Err(SystemError::AlreadyRegistered(path));
        }

        if self.config.max_actors != 0 && self.registry.len() >= self.config.max_actors {
            return Err(SystemError::ActorLimitExceeded {
                current: self.registry.len(),
                max: self.config.max_actors,
            });
        }

        let mailbox = Arc::new(Mailbox::new(props.mailbox_capacity, props.mailbox_policy));
        let system = self.arc();
        let self_ref = ActorRef::new(path.clone(), &mailbox, &system);

        if let Some(parent_path) = &parent {
            self.supervisor_for(parent_path).register_child(path.clone(), props.restart_policy);
        }

        let parent_ref = parent.as_ref().and_then(|p| self.lookup(p));
        let actor = (props.factory)();
        let checkpointer = self.checkpointer.clone();
        let props_for_task = props.clone();

        let task = tokio::spawn(run_actor_loop(
            system,
            path.clone(),
            parent_ref,
            mailbox.clone(),
            checkpointer,
            actor,
            self_ref.clone(),
            restart_cause,
        ));

        self.registry.insert(
            path,
            ActorHandle {
                mailbox,
                task,
                parent,
                props: props_for_task,
            },
        );
        Ok(self_ref)
    }

    /// Stops an actor voluntarily: closes its mailbox, aborts its task,
    /// unregisters it from its parent's supervisor, and notifies watchers.
    pub async fn stop(&self, path: &ActorPath) -> Result<(), SystemError> {
        if !self.registry.contains_key(path) {
            return Err(SystemError::NotFound(path.clone()));
        }
        if let Some(parent) = self.registry.get(path).and_then(|h| h.parent.clone()) {
            self.supervisor_for(&parent).unregister_child(path);
        }
        self.terminate_actor(path, true).await;
        Ok(())
    }

    async fn terminate_actor(&self, path: &ActorPath, notify_watchers: bool) {
        if let Some((_, handle)) = self.registry.remove(path) {
            handle.mailbox.close();
            handle.task.abort();
        }
        if notify_watchers {
            self.notify_watchers(path).await;
        }
    }

    /// Registers `watcher`'s interest in `target`'s termination. Idempotent.
    pub fn watch(&self, watcher: ActorPath, target: ActorPath) {
        let mut entry = self.watchers.entry(target).or_default();
        if !entry.contains(&watcher) {
            entry.push(watcher);
        }
    }

    /// Removes a prior [`ActorSystem::watch`] registration. A no-op if
    /// there was none.
    pub fn unwatch(&self, watcher: &ActorPath, target: &ActorPath) {
        if let Some(mut entry) = self.watchers.get_mut(target) {
            entry.retain(|w| w != watcher);
        }
    }

    async fn notify_watchers(&self, target: &ActorPath) {
        let Some((_, watchers)) = self.watchers.remove(target) else {
            return;
        };
        let event = LifecycleEvent::ChildTerminated {
            name: target.local_name().to_string(),
        };
        for watcher in watchers {
            if let Some(actor_ref) = self.lookup(&watcher) {
                let _ = actor_ref.tell(MessageKind::Lifecycle(event.clone()), None).await;
            }
        }
    }

    /// Called by a failed actor's own receive loop. Consults the parent's
    /// supervisor and carries out its decision. Returns `true` when the
    /// actor should keep running with its existing state (Resume).
    async fn on_actor_failure(&self, path: &ActorPath, cause: &str) -> bool {
        self.logger.warn(
            "actor receive failed",
            &[Attr::new("path", path.as_str()), Attr::new("cause", cause)],
        );

        let Some(parent) = self.registry.get(path).and_then(|h| h.parent.clone()) else {
            self.terminate_actor(path, true).await;
            return false;
        };

        let supervisor = self.supervisor_for(&parent);
        match supervisor.decide(path, cause) {
            SupervisionDecision::Resume => true,
            SupervisionDecision::Stop => {
                supervisor.unregister_child(path);
                self.terminate_actor(path, true).await;
                false
            }
            SupervisionDecision::Restart => {
                let delay = supervisor.restart_delay(path);
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                for sibling in supervisor.restart_set(path) {
                    let sibling_cause = if sibling == *path {
                        cause.to_string()
                    } else {
                        format!("sibling restarted: {cause}")
                    };
                    if let Err(err) = self.restart_actor(&sibling, sibling_cause).await {
                        self.logger.error(
                            "restart failed",
                            &[Attr::new("path", sibling.as_str()), Attr::new("error", err.to_string())],
                        );
                    }
                }
                false
            }
            SupervisionDecision::Escalate => {
                self.escalate(&parent, cause).await;
                false
            }
        }
    }

    async fn restart_actor(&self, path: &ActorPath, cause: String) -> Result<(), SystemError> {
        let (props, parent) = {
            let handle = self.registry.get(path).ok_or_else(|| SystemError::NotFound(path.clone()))?;
            (handle.props.clone(), handle.parent.clone())
        };
        self.terminate_actor(path, false).await;
        self.spawn_inner(props, parent, Some(path.clone()), Some(cause)).map(|_| ())
    }

    /// Treats a supervisor's own failure to contain a child as a failure of
    /// that supervisor one level up the tree (spec §4.4's Escalate).
    async fn escalate(&self, failed_supervisor: &ActorPath, cause: &str) {
        let grandparent = self.registry.get(failed_supervisor).and_then(|h| h.parent.clone());
        let escalated_cause = format!("escalated: {cause}");

        match grandparent {
            Some(grandparent) => {
                let decision = self.supervisor_for(&grandparent).decide(failed_supervisor, &escalated_cause);
                match decision {
                    SupervisionDecision::Restart => {
                        if let Err(err) = self.restart_actor(failed_supervisor, escalated_cause).await {
                            self.logger.error(
                                "escalated restart failed",
                                &[Attr::new("path", failed_supervisor.as_str()), Attr::new("error", err.to_string())],
                            );
                        }
                    }
                    SupervisionDecision::Resume => {}
                    SupervisionDecision::Stop | SupervisionDecision::Escalate => {
                        self.terminate_actor(failed_supervisor, true).await;
                    }
                }
            }
            None => {
                self.terminate_actor(failed_supervisor, true).await;
            }
        }
    }

    /// Stops every actor, drains the dispatcher, and cancels the shared
    /// cancellation token, within `shutdown_timeout`.
    pub async fn shutdown(&self) -> Result<(), SystemError> {
        self.cancellation.cancel();
        let paths: Vec<ActorPath> = self.registry.iter().map(|entry| entry.key().clone()).collect();

        let shutdown = async {
            for path in paths {
                self.terminate_actor(&path, false).await;
            }
            self.dispatcher.stop().await;
        };

        tokio::time::timeout(self.config.shutdown_timeout, shutdown)
            .await
            .map_err(|_| SystemError::ShutdownTimeout(self.config.shutdown_timeout))
    }
}

/// The per-actor receive loop, run as a standalone `tokio::spawn`ed task.
///
/// Processing of each message is handed off to the shared [`Dispatcher`]:
/// the actor instance is moved into the dispatched task for the duration
/// of one `receive` call and returned over a `oneshot` channel, so strict
/// per-actor serialization holds while the actual work runs on the shared
/// worker pool (spec §4.2, §4.3).
#[allow(clippy::too_many_arguments)]
async fn run_actor_loop(
    system: Arc<ActorSystem>,
    path: ActorPath,
    parent: Option<ActorRef>,
    mailbox: Arc<Mailbox<Message>>,
    checkpointer: Arc<dyn Checkpointer>,
    mut actor: Box<dyn Actor>,
    self_ref: ActorRef,
    restart_cause: Option<String>,
) {
    let startup_ctx = ActorContext::new(self_ref.clone(), parent.clone(), system.clone(), checkpointer.clone(), None);

    let startup_result = match &restart_cause {
        Some(cause) => actor.pre_restart(&startup_ctx, cause).await,
        None => actor.pre_start(&startup_ctx).await,
    };

    if let Err(err) = startup_result {
        system.on_actor_failure(&path, &err.to_string()).await;
        return;
    }

    if let Some(cause) = &restart_cause {
        if let Err(err) = actor.post_restart(&startup_ctx, cause).await {
            system.on_actor_failure(&path, &err.to_string()).await;
            return;
        }
    }

    loop {
        let Some(mut message) = mailbox.pop().await else {
            break;
        };
        let reply_to = message.reply_to.take();
        let ctx = ActorContext::new(self_ref.clone(), parent.clone(), system.clone(), checkpointer.clone(), reply_to);

        let (result_tx, result_rx) = oneshot::channel();
        let task: Task = Box::pin(async move {
            let result = actor.receive(&ctx, message).await;
            if let Some(channel) = ctx.take_pending_reply() {
                let _ = channel.send(Message::empty_reply());
            }
            let _ = result_tx.send((actor, result));
        });
        system.dispatcher.dispatch(task).await;

        match result_rx.await {
            Ok((returned_actor, Ok(()))) => {
                actor = returned_actor;
            }
            Ok((returned_actor, Err(err))) => {
                actor = returned_actor;
                if system.on_actor_failure(&path, &err.to_string()).await {
                    continue;
                }
                break;
            }
            Err(_) => return,
        }
    }

    let shutdown_ctx = ActorContext::new(self_ref, parent, system, checkpointer, None);
    let _ = actor.post_stop(&shutdown_ctx).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::{ActorError, Props};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration as StdDuration;

    struct Counter {
        seen: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Actor for Counter {
        async fn receive(&mut self, _ctx: &ActorContext, _message: Message) -> Result<(), ActorError> {
            self.seen.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct AlwaysFails;

    #[async_trait]
    impl Actor for AlwaysFails {
        async fn receive(&mut self, _ctx: &ActorContext, _message: Message) -> Result<(), ActorError> {
            Err(ActorError::Rejected("boom".to_string()))
        }
    }

    async fn running_system() -> Arc<ActorSystem> {
        let system = ActorSystem::new(SystemConfig::default());
        system.start().await;
        system
    }

    #[tokio::test]
    async fn spawned_actor_processes_messages() {
        let system = running_system().await;
        let seen = Arc::new(AtomicUsize::new(0));
        let props = Props::new(
            "counter",
            Arc::new({
                let seen = seen.clone();
                move || Box::new(Counter { seen: seen.clone() }) as Box<dyn Actor>
            }),
        );

        let actor_ref = system.spawn(props, None).unwrap();
        actor_ref.tell(MessageKind::Command("ping".to_string()), None).await.unwrap();
        actor_ref.tell(MessageKind::Command("ping".to_string()), None).await.unwrap();

        tokio::time::sleep(StdDuration::from_millis(30)).await;
        assert_eq!(seen.load(Ordering::SeqCst), 2);
        system.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn duplicate_path_is_rejected() {
        let system = running_system().await;
        let factory: crate::actor::ActorFactory = Arc::new(|| Box::new(AlwaysFails) as Box<dyn Actor>);
        system.spawn(Props::new("dup", factory.clone()), None).unwrap();

        let result = system.spawn(Props::new("dup", factory), None);
        assert!(matches!(result, Err(SystemError::AlreadyRegistered(_))));
        system.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn stop_of_unknown_path_is_reported() {
        let system = running_system().await;
        let result = system.stop(&ActorPath::root("ghost")).await;
        assert!(matches!(result, Err(SystemError::NotFound(_))));
        system.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn failing_actor_gets_restarted_by_default_supervision() {
        let system = running_system().await;
        let parent_props = Props::new(
            "parent",
            Arc::new(|| Box::new(Counter { seen: Arc::new(AtomicUsize::new(0)) }) as Box<dyn Actor>),
        );
        let parent_ref = system.spawn(parent_props, None).unwrap();

        let child_factory: crate::actor::ActorFactory = Arc::new(|| Box::new(AlwaysFails) as Box<dyn Actor>);
        let child_props = Props::new("child", child_factory);
        let child_ref = system.spawn(child_props, Some(parent_ref.path().clone())).unwrap();

        child_ref.tell(MessageKind::Command("trigger".to_string()), None).await.unwrap();
        tokio::time::sleep(StdDuration::from_millis(50)).await;

        // after a restart the path is still registered (a fresh instance
        // took over), even though the original actor instance errored out.
        assert!(system.lookup(child_ref.path()).is_some());
        system.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn watchers_are_notified_on_voluntary_stop() {
        let system = running_system().await;
        let seen = Arc::new(AtomicUsize::new(0));
        let watcher_props = Props::new(
            "watcher",
            Arc::new({
                let seen = seen.clone();
                move || Box::new(Counter { seen: seen.clone() }) as Box<dyn Actor>
            }),
        );
        let watcher_ref = system.spawn(watcher_props, None).unwrap();

        let target_factory: crate::actor::ActorFactory =
            Arc::new(|| Box::new(Counter { seen: Arc::new(AtomicUsize::new(0)) }) as Box<dyn Actor>);
        let target_ref = system.spawn(Props::new("target", target_factory), None).unwrap();

        system.watch(watcher_ref.path().clone(), target_ref.path().clone());
        system.stop(target_ref.path()).await.unwrap();

        tokio::time::sleep(StdDuration::from_millis(30)).await;
        assert_eq!(seen.load(Ordering::SeqCst), 1);
        system.shutdown().await.unwrap();
    }
}
