// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Scripted [`WapiApi`] implementation for unit tests.
//!
//! Each method pops the next scripted response for that method and records the
//! call. An unscripted call fails with `InvalidRequest`, so a test that expects zero
//! API calls can assert on [`MockWapi::calls`] being empty.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;

use super::{RequestOptions, WapiApi};
use crate::errors::ClientError;

/// One recorded call against the mock.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Read {
        reference: String,
        options: RequestOptions,
    },
    List {
        object_type: String,
        options: RequestOptions,
    },
    Create {
        object_type: String,
        body: Value,
    },
    Update {
        reference: String,
        body: Value,
    },
    Delete {
        reference: String,
    },
}

#[derive(Default)]
pub struct MockWapi {
    calls: Mutex<Vec<Call>>,
    reads: Mutex<VecDeque<Result<Value, ClientError>>>,
    lists: Mutex<VecDeque<Result<Vec<Value>, ClientError>>>,
    creates: Mutex<VecDeque<Result<Value, ClientError>>>,
    updates: Mutex<VecDeque<Result<Value, ClientError>>>,
    deletes: Mutex<VecDeque<Result<(), ClientError>>>,
}

fn unexpected(method: &str) -> ClientError {
    ClientError::InvalidRequest(format!("unexpected {method} call"))
}

fn pop<T>(queue: &Mutex<VecDeque<Result<T, ClientError>>>, method: &str) -> Result<T, ClientError> {
    queue
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or_else(|| Err(unexpected(method)))
}

/// 404 error for `reference`.
pub fn not_found(reference: &str) -> ClientError {
    ClientError::NotFound {
        reference: reference.to_string(),
        status: 404,
    }
}

impl MockWapi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_read(self, response: Result<Value, ClientError>) -> Self {
        self.reads.lock().unwrap().push_back(response);
        self
    }

    pub fn on_list(self, response: Result<Vec<Value>, ClientError>) -> Self {
        self.lists.lock().unwrap().push_back(response);
        self
    }

    pub fn on_create(self, response: Result<Value, ClientError>) -> Self {
        self.creates.lock().unwrap().push_back(response);
        self
    }

    pub fn on_update(self, response: Result<Value, ClientError>) -> Self {
        self.updates.lock().unwrap().push_back(response);
        self
    }

    pub fn on_delete(self, response: Result<(), ClientError>) -> Self {
        self.deletes.lock().unwrap().push_back(response);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl WapiApi for MockWapi {
    async fn read(&self, reference: &str, options: &RequestOptions) -> Result<Value, ClientError> {
        self.record(Call::Read {
            reference: reference.to_string(),
            options: options.clone(),
        });
        pop(&self.reads, "read")
    }

    async fn list(
        &self,
        object_type: &str,
        options: &RequestOptions,
    ) -> Result<Vec<Value>, ClientError> {
        self.record(Call::List {
            object_type: object_type.to_string(),
            options: options.clone(),
        });
        pop(&self.lists, "list")
    }

    async fn create(
        &self,
        object_type: &str,
        body: &Value,
        _options: &RequestOptions,
    ) -> Result<Value, ClientError> {
        self.record(Call::Create {
            object_type: object_type.to_string(),
            body: body.clone(),
        });
        pop(&self.creates, "create")
    }

    async fn update(
        &self,
        reference: &str,
        body: &Value,
        _options: &RequestOptions,
    ) -> Result<Value, ClientError> {
        self.record(Call::Update {
            reference: reference.to_string(),
            body: body.clone(),
        });
        pop(&self.updates, "update")
    }

    async fn delete(&self, reference: &str) -> Result<(), ClientError> {
        self.record(Call::Delete {
            reference: reference.to_string(),
        });
        pop(&self.deletes, "delete")
    }
}
