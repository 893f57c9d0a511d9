#![allow(dead_code)]

use rusqlite::ffi;
use std::cell::{Cell, RefCell};
use themereview_core::db::DbError;
use themereview_core::{
    DocId, Document, DocumentReviewRepository, DocumentStore, DocumentThemeRepository, Filter,
    StoreError, StoreResult, Theme, ThemeAggregateMaintainer, ThemeRepository, UpdateResult,
    UpdateSpec,
};

pub type Maintainer<S> =
    ThemeAggregateMaintainer<DocumentThemeRepository<S>, DocumentReviewRepository<S>>;

pub fn maintainer<S: DocumentStore + Copy>(store: S) -> Maintainer<S> {
    ThemeAggregateMaintainer::new(
        DocumentThemeRepository::new(store),
        DocumentReviewRepository::new(store),
    )
}

pub fn seed_theme<S: DocumentStore>(store: S, name: &str) -> DocId {
    DocumentThemeRepository::new(store)
        .create_theme(&Theme::new(name))
        .unwrap()
}

pub fn load_theme<S: DocumentStore>(store: S, id: DocId) -> Theme {
    DocumentThemeRepository::new(store)
        .get_theme(id)
        .unwrap()
        .unwrap()
}

pub fn injected_fault() -> StoreError {
    StoreError::Db(DbError::Sqlite(rusqlite::Error::SqliteFailure(
        ffi::Error::new(ffi::SQLITE_IOERR),
        Some("injected fault".to_string()),
    )))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    FindOne,
    FindAll,
    Insert,
    Replace,
    Update(&'static str),
    Delete,
}

#[derive(Debug, Clone, Copy)]
pub struct Op<'c> {
    pub kind: OpKind,
    pub collection: &'c str,
}

impl Op<'_> {
    pub fn is_mutation(&self) -> bool {
        !matches!(self.kind, OpKind::FindOne | OpKind::FindAll)
    }

    pub fn is(&self, kind: OpKind, collection: &str) -> bool {
        self.kind == kind && self.collection == collection
    }
}

type Predicate<'a> = Box<dyn Fn(&Op<'_>) -> bool + 'a>;

/// Store wrapper that counts writes, injects faults and runs a one-shot hook
/// before a chosen operation.
pub struct ProbeStore<'a, S: DocumentStore> {
    inner: S,
    fault: RefCell<Option<(Predicate<'a>, usize)>>,
    hook: RefCell<Option<(Predicate<'a>, Box<dyn FnOnce() + 'a>)>>,
    mutations: Cell<usize>,
}

impl<'a, S: DocumentStore> ProbeStore<'a, S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            fault: RefCell::new(None),
            hook: RefCell::new(None),
            mutations: Cell::new(0),
        }
    }

    /// Fails the next `times` operations matching `predicate`.
    pub fn fail_when(self, times: usize, predicate: impl Fn(&Op<'_>) -> bool + 'a) -> Self {
        *self.fault.borrow_mut() = Some((Box::new(predicate), times));
        self
    }

    /// Runs `hook` once, right before the first operation matching `predicate`.
    pub fn before_first(
        self,
        predicate: impl Fn(&Op<'_>) -> bool + 'a,
        hook: impl FnOnce() + 'a,
    ) -> Self {
        *self.hook.borrow_mut() = Some((Box::new(predicate), Box::new(hook)));
        self
    }

    /// Writes that reached the inner store.
    pub fn mutations(&self) -> usize {
        self.mutations.get()
    }

    fn enter(&self, op: Op<'_>) -> StoreResult<()> {
        let fire = matches!(&*self.hook.borrow(), Some((predicate, _)) if predicate(&op));
        if fire {
            let taken = self.hook.borrow_mut().take();
            if let Some((_, hook)) = taken {
                hook();
            }
        }

        if let Some((predicate, remaining)) = self.fault.borrow_mut().as_mut() {
            if *remaining > 0 && predicate(&op) {
                *remaining -= 1;
                return Err(injected_fault());
            }
        }

        if op.is_mutation() {
            self.mutations.set(self.mutations.get() + 1);
        }
        Ok(())
    }
}

impl<S: DocumentStore> DocumentStore for ProbeStore<'_, S> {
    fn find_one(&self, collection: &str, filter: &Filter) -> StoreResult<Option<Document>> {
        self.enter(Op {
            kind: OpKind::FindOne,
            collection,
        })?;
        self.inner.find_one(collection, filter)
    }

    fn find_all(&self, collection: &str, filter: &Filter) -> StoreResult<Vec<Document>> {
        self.enter(Op {
            kind: OpKind::FindAll,
            collection,
        })?;
        self.inner.find_all(collection, filter)
    }

    fn insert_one(&self, collection: &str, document: Document) -> StoreResult<DocId> {
        self.enter(Op {
            kind: OpKind::Insert,
            collection,
        })?;
        self.inner.insert_one(collection, document)
    }

    fn replace_one(
        &self,
        collection: &str,
        filter: &Filter,
        document: Document,
    ) -> StoreResult<UpdateResult> {
        self.enter(Op {
            kind: OpKind::Replace,
            collection,
        })?;
        self.inner.replace_one(collection, filter, document)
    }

    fn update_one(
        &self,
        collection: &str,
        filter: &Filter,
        update: &UpdateSpec,
    ) -> StoreResult<UpdateResult> {
        self.enter(Op {
            kind: OpKind::Update(update.op_name()),
            collection,
        })?;
        self.inner.update_one(collection, filter, update)
    }

    fn delete_one(&self, collection: &str, filter: &Filter) -> StoreResult<u64> {
        self.enter(Op {
            kind: OpKind::Delete,
            collection,
        })?;
        self.inner.delete_one(collection, filter)
    }
}
