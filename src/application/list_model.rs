// src/application/list_model.rs
//
// Paginated, filterable list model
//
// One Tokio task owns the list. Handles send it commands over an mpsc
// channel and get answers on oneshot replies; observers read immutable
// snapshots from a watch channel.
//
// RULES:
// - Storage is written first, memory only after success
// - A failed call leaves the list as it was and fills the error slot
// - `visible` is always recomputed from (items, filter)
// - Storage calls run on the blocking pool, never on the actor task

use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};

use crate::application::error_handling::ErrorResponse;
use crate::domain::RecordId;
use crate::error::{AppError, AppResult};
use crate::services::run_blocking;

const COMMAND_BUFFER: usize = 32;

/// Per-entity parameterisation of a list model
pub trait ListSource: Send + Sync + 'static {
    type Item: Clone + Send + Sync + 'static;
    type Filter: Clone + Default + Send + Sync + 'static;

    fn id(item: &Self::Item) -> RecordId;

    /// One page in storage order
    fn fetch_page(&self, offset: usize, limit: usize) -> AppResult<Vec<Self::Item>>;

    /// Persist a new item and return it with its assigned id
    fn insert(&self, item: Self::Item) -> AppResult<Self::Item>;

    /// Persist changes and return the stored version
    fn update(&self, item: &Self::Item) -> AppResult<Self::Item>;

    fn delete(&self, item: &Self::Item) -> AppResult<()>;

    fn matches(filter: &Self::Filter, item: &Self::Item) -> bool;

    /// Order of the visible list. Storage order is kept by default.
    fn sort_visible(_visible: &mut Vec<Self::Item>) {}
}

/// Immutable view of a list model at one point in time
#[derive(Debug, Clone)]
pub struct ListSnapshot<T, F> {
    /// Everything loaded so far, in storage order
    pub items: Vec<T>,
    /// `items` passing the current filter
    pub visible: Vec<T>,
    pub filter: F,
    pub pages_loaded: usize,
    pub is_loading: bool,
    pub end_of_data: bool,
    pub error: Option<ErrorResponse>,
}

impl<T, F: Default> ListSnapshot<T, F> {
    fn empty() -> Self {
        Self {
            items: Vec::new(),
            visible: Vec::new(),
            filter: F::default(),
            pages_loaded: 0,
            is_loading: false,
            end_of_data: false,
            error: None,
        }
    }
}

pub type SnapshotOf<S> = Arc<ListSnapshot<<S as ListSource>::Item, <S as ListSource>::Filter>>;

type Reply<T> = oneshot::Sender<AppResult<T>>;

enum Command<S: ListSource> {
    LoadNextPage(Reply<usize>),
    Refresh(Reply<usize>),
    ApplyFilter(S::Filter, oneshot::Sender<usize>),
    Insert(S::Item, Reply<S::Item>),
    Update(S::Item, Reply<()>),
    Delete(S::Item, Reply<()>),
    ReplaceLocal(S::Item, oneshot::Sender<bool>),
    ClearError(oneshot::Sender<Option<ErrorResponse>>),
}

/// Handle to a running list model. Cheap to clone; the task stops
/// once every handle is dropped.
pub struct ListModel<S: ListSource> {
    commands: mpsc::Sender<Command<S>>,
    snapshots: watch::Receiver<SnapshotOf<S>>,
}

impl<S: ListSource> Clone for ListModel<S> {
    fn clone(&self) -> Self {
        Self {
            commands: self.commands.clone(),
            snapshots: self.snapshots.clone(),
        }
    }
}

fn model_stopped() -> AppError {
    AppError::Other("List model has stopped".to_string())
}

impl<S: ListSource> ListModel<S> {
    /// Start the owning task. Must be called inside a Tokio runtime.
    pub fn spawn(source: S, page_size: usize) -> Self {
        let (commands, inbox) = mpsc::channel(COMMAND_BUFFER);
        let (publisher, snapshots) = watch::channel(Arc::new(ListSnapshot::empty()));

        let actor = ListActor {
            source: Arc::new(source),
            page_size: page_size.max(1),
            items: Vec::new(),
            visible: Vec::new(),
            filter: S::Filter::default(),
            pages_loaded: 0,
            next_offset: 0,
            is_loading: false,
            end_of_data: false,
            error: None,
            publisher,
        };
        tokio::spawn(actor.run(inbox));

        Self {
            commands,
            snapshots,
        }
    }

    /// Fetch and append the next page. Returns how many new items were added;
    /// `0` once the source is exhausted.
    pub async fn load_next_page(&self) -> AppResult<usize> {
        self.request(Command::LoadNextPage).await
    }

    /// Drop everything loaded and fetch the first page again
    pub async fn refresh(&self) -> AppResult<usize> {
        self.request(Command::Refresh).await
    }

    /// Returns the number of visible items
    pub async fn apply_filter(&self, filter: S::Filter) -> AppResult<usize> {
        self.ask(|reply| Command::ApplyFilter(filter, reply)).await
    }

    pub async fn insert(&self, item: S::Item) -> AppResult<S::Item> {
        self.request(|reply| Command::Insert(item, reply)).await
    }

    pub async fn update(&self, item: S::Item) -> AppResult<()> {
        self.request(|reply| Command::Update(item, reply)).await
    }

    pub async fn delete(&self, item: S::Item) -> AppResult<()> {
        self.request(|reply| Command::Delete(item, reply)).await
    }

    /// Swap in an item some service call already persisted.
    /// Returns false if no loaded item has that id.
    pub async fn replace_local(&self, item: S::Item) -> AppResult<bool> {
        self.ask(|reply| Command::ReplaceLocal(item, reply)).await
    }

    /// Take the pending error, if any
    pub async fn clear_error(&self) -> AppResult<Option<ErrorResponse>> {
        self.ask(Command::ClearError).await
    }

    pub fn snapshot(&self) -> SnapshotOf<S> {
        Arc::clone(&self.snapshots.borrow())
    }

    /// Receiver notified on every change
    pub fn subscribe(&self) -> watch::Receiver<SnapshotOf<S>> {
        self.snapshots.clone()
    }

    async fn request<T>(&self, make: impl FnOnce(Reply<T>) -> Command<S>) -> AppResult<T> {
        self.ask(make).await?
    }

    async fn ask<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> Command<S>) -> AppResult<T> {
        let (reply, answer) = oneshot::channel();
        self.commands
            .send(make(reply))
            .await
            .map_err(|_| model_stopped())?;
        answer.await.map_err(|_| model_stopped())
    }
}

struct ListActor<S: ListSource> {
    source: Arc<S>,
    page_size: usize,
    items: Vec<S::Item>,
    visible: Vec<S::Item>,
    filter: S::Filter,
    pages_loaded: usize,
    /// Storage offset of the next page; follows local inserts and deletes
    next_offset: usize,
    is_loading: bool,
    end_of_data: bool,
    error: Option<ErrorResponse>,
    publisher: watch::Sender<SnapshotOf<S>>,
}

impl<S: ListSource> ListActor<S> {
    async fn run(mut self, mut inbox: mpsc::Receiver<Command<S>>) {
        while let Some(command) = inbox.recv().await {
            // A dropped reply only means the caller stopped waiting
            match command {
                Command::LoadNextPage(reply) => {
                    let _ = reply.send(self.load_next_page().await);
                }
                Command::Refresh(reply) => {
                    let _ = reply.send(self.refresh().await);
                }
                Command::ApplyFilter(filter, reply) => {
                    self.filter = filter;
                    self.recompute_visible();
                    self.publish();
                    let _ = reply.send(self.visible.len());
                }
                Command::Insert(item, reply) => {
                    let _ = reply.send(self.insert(item).await);
                }
                Command::Update(item, reply) => {
                    let _ = reply.send(self.update(item).await);
                }
                Command::Delete(item, reply) => {
                    let _ = reply.send(self.delete(item).await);
                }
                Command::ReplaceLocal(item, reply) => {
                    let replaced = self.replace(item);
                    if replaced {
                        self.recompute_visible();
                        self.publish();
                    }
                    let _ = reply.send(replaced);
                }
                Command::ClearError(reply) => {
                    let error = self.error.take();
                    if error.is_some() {
                        self.publish();
                    }
                    let _ = reply.send(error);
                }
            }
        }
        log::debug!("List model stopped with {} items loaded", self.items.len());
    }

    async fn call<T, F>(&self, f: F) -> AppResult<T>
    where
        F: FnOnce(&S) -> AppResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let source = Arc::clone(&self.source);
        run_blocking(move || f(&source)).await
    }

    async fn fetch(&mut self, offset: usize) -> AppResult<Vec<S::Item>> {
        let limit = self.page_size;
        self.is_loading = true;
        self.publish();
        let result = self.call(move |s| s.fetch_page(offset, limit)).await;
        self.is_loading = false;
        result
    }

    async fn load_next_page(&mut self) -> AppResult<usize> {
        if self.end_of_data {
            return Ok(0);
        }

        let page = match self.fetch(self.next_offset).await {
            Ok(page) => page,
            Err(e) => return Err(self.fail(e)),
        };

        if page.is_empty() {
            self.end_of_data = true;
            self.publish();
            return Ok(0);
        }

        self.pages_loaded += 1;
        self.next_offset += page.len();
        let appended = self.append(page);
        self.recompute_visible();
        self.publish();
        Ok(appended)
    }

    async fn refresh(&mut self) -> AppResult<usize> {
        let page = match self.fetch(0).await {
            Ok(page) => page,
            Err(e) => return Err(self.fail(e)),
        };

        self.items.clear();
        self.end_of_data = page.is_empty();
        self.pages_loaded = usize::from(!page.is_empty());
        self.next_offset = page.len();
        let loaded = self.append(page);
        self.recompute_visible();
        self.publish();
        Ok(loaded)
    }

    async fn insert(&mut self, item: S::Item) -> AppResult<S::Item> {
        let stored = match self.call(move |s| s.insert(item)).await {
            Ok(stored) => stored,
            Err(e) => return Err(self.fail(e)),
        };

        let id = S::id(&stored);
        self.items.retain(|existing| S::id(existing) != id);
        self.items.insert(0, stored.clone());
        self.next_offset += 1;
        self.recompute_visible();
        self.publish();
        Ok(stored)
    }

    async fn update(&mut self, item: S::Item) -> AppResult<()> {
        let stored = match self.call(move |s| s.update(&item)).await {
            Ok(stored) => stored,
            Err(e) => return Err(self.fail(e)),
        };

        if self.replace(stored) {
            self.recompute_visible();
            self.publish();
        }
        Ok(())
    }

    async fn delete(&mut self, item: S::Item) -> AppResult<()> {
        let id = S::id(&item);
        if let Err(e) = self.call(move |s| s.delete(&item)).await {
            return Err(self.fail(e));
        }

        let before = self.items.len();
        self.items.retain(|existing| S::id(existing) != id);
        if self.items.len() < before {
            self.next_offset = self.next_offset.saturating_sub(1);
        }
        self.recompute_visible();
        self.publish();
        Ok(())
    }

    /// Append items whose id is not loaded yet
    fn append(&mut self, page: Vec<S::Item>) -> usize {
        let mut known: HashSet<RecordId> = self.items.iter().map(S::id).collect();
        let before = self.items.len();
        self.items
            .extend(page.into_iter().filter(|item| known.insert(S::id(item))));
        self.items.len() - before
    }

    fn replace(&mut self, item: S::Item) -> bool {
        let id = S::id(&item);
        match self.items.iter_mut().find(|existing| S::id(existing) == id) {
            Some(slot) => {
                *slot = item;
                true
            }
            None => false,
        }
    }

    fn recompute_visible(&mut self) {
        let filter = &self.filter;
        let mut visible: Vec<S::Item> = self
            .items
            .iter()
            .filter(|item| S::matches(filter, item))
            .cloned()
            .collect();
        S::sort_visible(&mut visible);
        self.visible = visible;
    }

    fn fail(&mut self, error: AppError) -> AppError {
        log::warn!("List operation failed: {}", error);
        self.error = Some(ErrorResponse::from_app_error(&error));
        self.publish();
        error
    }

    fn publish(&self) {
        self.publisher.send_replace(Arc::new(ListSnapshot {
            items: self.items.clone(),
            visible: self.visible.clone(),
            filter: self.filter.clone(),
            pages_loaded: self.pages_loaded,
            is_loading: self.is_loading,
            end_of_data: self.end_of_data,
            error: self.error.clone(),
        }));
    }
}
