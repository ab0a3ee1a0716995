//! Shared test support: a scripted in-memory connection and model types.
#![allow(dead_code)] // each test binary uses a different slice of this module
//!
//! `FakeConnection` implements the ORM's `Connection` boundary over a shared
//! state cell. Tests script result rows and outcomes ahead of time, then
//! inspect the operation log, the staged/committed statement lists, and the
//! autocommit flag afterwards.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use hotaru_orm::{
    Connection, Descriptor, Error, FieldSet, Model, Outcome, Params, Result, Row, RowCursor,
    Session, Value,
};

/// Observable state shared between a test and its fake connection.
pub struct FakeState {
    /// Every boundary call, in order, as a readable line.
    pub log: Vec<String>,
    /// Every executed statement with its bindings.
    pub executed: Vec<(String, Params)>,
    /// Canned result row sets, consumed per query.
    pub scripted_rows: VecDeque<Vec<Row>>,
    /// Canned execute outcomes; when exhausted, executes report one affected
    /// row and the next auto-increment id.
    pub scripted_outcomes: VecDeque<Outcome>,
    /// Statements applied inside an open transaction.
    pub staged: Vec<String>,
    /// Statements visible outside any transaction.
    pub committed: Vec<String>,
    /// Simulated autocommit flag.
    pub autocommit: bool,
    /// Set to make `execute`/`query` fail when the SQL contains this text.
    pub fail_on: Option<String>,
    /// Whether `close` has been delivered.
    pub closed: bool,
    next_insert_id: u64,
    in_transaction: bool,
}

impl FakeState {
    /// Creates a fresh shared state cell.
    pub fn shared() -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self {
            log: Vec::new(),
            executed: Vec::new(),
            scripted_rows: VecDeque::new(),
            scripted_outcomes: VecDeque::new(),
            staged: Vec::new(),
            committed: Vec::new(),
            autocommit: true,
            fail_on: None,
            closed: false,
            next_insert_id: 0,
            in_transaction: false,
        }))
    }
}

/// A connection whose behavior is entirely scripted through a `FakeState`.
pub struct FakeConnection {
    state: Rc<RefCell<FakeState>>,
}

impl FakeConnection {
    pub fn new(state: &Rc<RefCell<FakeState>>) -> Self {
        Self {
            state: Rc::clone(state),
        }
    }

    fn check_failure(&self, sql: &str) -> Result<()> {
        let state = self.state.borrow();
        match &state.fail_on {
            Some(marker) if sql.contains(marker.as_str()) => {
                Err(Error::driver(format!("scripted failure on `{marker}`")))
            }
            _ => Ok(()),
        }
    }
}

impl Connection for FakeConnection {
    fn execute(&mut self, sql: &str, params: &Params) -> Result<Outcome> {
        self.check_failure(sql)?;
        let mut state = self.state.borrow_mut();
        state.log.push(format!("execute {sql}"));
        state.executed.push((sql.to_string(), params.clone()));
        if state.in_transaction {
            state.staged.push(sql.to_string());
        } else {
            state.committed.push(sql.to_string());
        }
        let outcome = state.scripted_outcomes.pop_front().unwrap_or_else(|| {
            state.next_insert_id += 1;
            Outcome {
                affected: 1,
                last_insert_id: Some(state.next_insert_id),
            }
        });
        Ok(outcome)
    }

    fn query(&mut self, sql: &str, params: &Params) -> Result<Vec<Row>> {
        self.check_failure(sql)?;
        let mut state = self.state.borrow_mut();
        state.log.push(format!("query {sql}"));
        state.executed.push((sql.to_string(), params.clone()));
        Ok(state.scripted_rows.pop_front().unwrap_or_default())
    }

    fn query_iter<'a>(
        &'a mut self,
        sql: &str,
        params: &Params,
    ) -> Result<Box<dyn RowCursor + 'a>> {
        self.check_failure(sql)?;
        let rows = {
            let mut state = self.state.borrow_mut();
            state.log.push(format!("cursor {sql}"));
            state.executed.push((sql.to_string(), params.clone()));
            state.scripted_rows.pop_front().unwrap_or_default()
        };
        struct VecCursor {
            rows: std::vec::IntoIter<Row>,
            state: Rc<RefCell<FakeState>>,
        }
        impl RowCursor for VecCursor {
            fn next_row(&mut self) -> Option<Result<Row>> {
                self.rows.next().map(Ok)
            }
        }
        impl Drop for VecCursor {
            fn drop(&mut self) {
                self.state.borrow_mut().log.push("cursor released".into());
            }
        }
        Ok(Box::new(VecCursor {
            rows: rows.into_iter(),
            state: Rc::clone(&self.state),
        }))
    }

    fn execute_batch(&mut self, sql: &str, rows: &[Vec<Value>]) -> Result<u64> {
        self.check_failure(sql)?;
        let mut state = self.state.borrow_mut();
        state
            .log
            .push(format!("batch x{} {sql}", rows.len()));
        if state.in_transaction {
            state.staged.push(sql.to_string());
        } else {
            state.committed.push(sql.to_string());
        }
        Ok(rows.len() as u64)
    }

    fn begin(&mut self) -> Result<()> {
        let mut state = self.state.borrow_mut();
        state.log.push("begin".into());
        state.in_transaction = true;
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        let mut state = self.state.borrow_mut();
        state.log.push("commit".into());
        state.in_transaction = false;
        let staged = std::mem::take(&mut state.staged);
        state.committed.extend(staged);
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        let mut state = self.state.borrow_mut();
        state.log.push("rollback".into());
        state.in_transaction = false;
        state.staged.clear();
        Ok(())
    }

    fn autocommit(&self) -> bool {
        self.state.borrow().autocommit
    }

    fn set_autocommit(&mut self, enabled: bool) -> Result<()> {
        let mut state = self.state.borrow_mut();
        state.log.push(format!("autocommit {enabled}"));
        state.autocommit = enabled;
        Ok(())
    }

    fn ping(&mut self) -> bool {
        self.state.borrow_mut().log.push("ping".into());
        true
    }

    fn reconnect(&mut self) -> Result<()> {
        self.state.borrow_mut().log.push("reconnect".into());
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        let mut state = self.state.borrow_mut();
        assert!(!state.closed, "connection closed twice");
        state.closed = true;
        state.log.push("close".into());
        Ok(())
    }
}

/// Opens a session over a fake connection sharing `state`.
pub fn session(state: &Rc<RefCell<FakeState>>) -> Session {
    Session::from_connection(Box::new(FakeConnection::new(state)))
}

thread_local! {
    static CURRENT: RefCell<Option<Rc<RefCell<FakeState>>>> = const { RefCell::new(None) };
}

/// Installs a fake connector for sessions opened from the default
/// configuration (the temporary-session path) and returns the state cell
/// those sessions will share.
pub fn install_fake() -> Rc<RefCell<FakeState>> {
    let state = FakeState::shared();
    CURRENT.with(|current| *current.borrow_mut() = Some(Rc::clone(&state)));
    hotaru_orm::register_connector(|_config| {
        CURRENT.with(|current| {
            current
                .borrow()
                .as_ref()
                .map(|state| Box::new(FakeConnection::new(state)) as Box<dyn Connection>)
                .ok_or_else(|| Error::driver("no fake state installed on this thread"))
        })
    });
    state
}

/// Builds a result row from `(column, value)` pairs.
pub fn row(pairs: &[(&str, Value)]) -> Row {
    Row::new(
        pairs.iter().map(|(c, _)| (*c).to_string()).collect(),
        pairs.iter().map(|(_, v)| v.clone()).collect(),
    )
}

// ── Shared model types ─────────────────────────────────────────────────

/// Map-backed model: `item(id PK AUTO_INCREMENT, name)`.
#[derive(Default)]
pub struct Item {
    pub record: FieldSet,
}

impl Model for Item {
    fn descriptor() -> &'static Descriptor {
        static DESCRIPTOR: Descriptor = Descriptor {
            table: "item",
            primary_keys: &["id"],
            auto_increment: Some("id"),
            fields: &["name"],
        };
        &DESCRIPTOR
    }

    fn value(&self, column: &str) -> Result<Value> {
        self.record.checked_get(Self::descriptor(), column)
    }

    fn set_value(&mut self, column: &str, value: Value) -> Result<()> {
        self.record.checked_put(Self::descriptor(), column, value)
    }

    fn contains(&self, column: &str) -> bool {
        self.record.contains(column)
    }
}

/// Map-backed model: `blog_user(uid PK AUTO_INCREMENT, username, age)`.
#[derive(Default)]
pub struct BlogUser {
    pub record: FieldSet,
}

impl Model for BlogUser {
    fn descriptor() -> &'static Descriptor {
        static DESCRIPTOR: Descriptor = Descriptor {
            table: "blog_user",
            primary_keys: &["uid"],
            auto_increment: Some("uid"),
            fields: &["username", "age"],
        };
        &DESCRIPTOR
    }

    fn value(&self, column: &str) -> Result<Value> {
        self.record.checked_get(Self::descriptor(), column)
    }

    fn set_value(&mut self, column: &str, value: Value) -> Result<()> {
        self.record.checked_put(Self::descriptor(), column, value)
    }

    fn contains(&self, column: &str) -> bool {
        self.record.contains(column)
    }
}

/// Struct-backed model: `blog_article(aid PK AUTO_INCREMENT, author_uid,
/// title, content)`. The auto-increment key is absent while `None`.
#[derive(Default, Clone)]
pub struct BlogArticle {
    pub aid: Option<i64>,
    pub author_uid: i64,
    pub title: String,
    pub content: String,
}

impl Model for BlogArticle {
    fn descriptor() -> &'static Descriptor {
        static DESCRIPTOR: Descriptor = Descriptor {
            table: "blog_article",
            primary_keys: &["aid"],
            auto_increment: Some("aid"),
            fields: &["author_uid", "title", "content"],
        };
        &DESCRIPTOR
    }

    fn value(&self, column: &str) -> Result<Value> {
        match column {
            "aid" => Ok(Value::from(self.aid)),
            "author_uid" => Ok(Value::from(self.author_uid)),
            "title" => Ok(Value::from(self.title.as_str())),
            "content" => Ok(Value::from(self.content.as_str())),
            other => Err(Error::invalid_column(Self::descriptor().table, other)),
        }
    }

    fn set_value(&mut self, column: &str, value: Value) -> Result<()> {
        match column {
            "aid" => self.aid = value.as_int(),
            "author_uid" => self.author_uid = value.as_int().unwrap_or_default(),
            "title" => {
                if let Value::String(s) = value {
                    self.title = s;
                }
            }
            "content" => {
                if let Value::String(s) = value {
                    self.content = s;
                }
            }
            other => return Err(Error::invalid_column(Self::descriptor().table, other)),
        }
        Ok(())
    }

    fn contains(&self, column: &str) -> bool {
        match column {
            "aid" => self.aid.is_some(),
            _ => Self::descriptor().declares(column),
        }
    }
}

/// Map-backed model: `blog_rating(aid PK, rating)`, no auto-increment key.
#[derive(Default)]
pub struct BlogRating {
    pub record: FieldSet,
}

impl Model for BlogRating {
    fn descriptor() -> &'static Descriptor {
        static DESCRIPTOR: Descriptor = Descriptor {
            table: "blog_rating",
            primary_keys: &["aid"],
            auto_increment: None,
            fields: &["rating"],
        };
        &DESCRIPTOR
    }

    fn value(&self, column: &str) -> Result<Value> {
        self.record.checked_get(Self::descriptor(), column)
    }

    fn set_value(&mut self, column: &str, value: Value) -> Result<()> {
        self.record.checked_put(Self::descriptor(), column, value)
    }

    fn contains(&self, column: &str) -> bool {
        self.record.contains(column)
    }
}
