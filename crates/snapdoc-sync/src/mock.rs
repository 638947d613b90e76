// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-process transport for tests and offline runs.
//
// Replies are scripted per path; every call is recorded (path, body, bearer)
// so tests can assert on exactly what went over the "wire", including that
// nothing did.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::client::{LOGIN_PATH, REGISTER_PATH, UPLOAD_PATH};
use crate::transport::{Transport, TransportError, TransportResponse};

type Reply =
    Arc<dyn Fn(&Value, Option<&str>) -> Result<TransportResponse, TransportError> + Send + Sync>;

/// One request as the mock received it.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub path: String,
    pub body: Value,
    pub bearer: Option<String>,
}

#[derive(Clone, Default)]
pub struct MockTransport {
    replies: Arc<Mutex<HashMap<String, Reply>>>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// A service that accepts any credentials (issuing `token`) and any
    /// upload that carries a bearer token.
    pub fn accepting(token: impl Into<String>) -> Self {
        let token = token.into();
        let mock = Self::new();
        for auth_path in [LOGIN_PATH, REGISTER_PATH] {
            let token = token.clone();
            mock.reply_with(auth_path, move |body, _| {
                let email = body.get("email").cloned().unwrap_or(Value::Null);
                Ok(json_response(
                    200,
                    &json!({"user": {"id": "1", "email": email}, "token": token}),
                ))
            });
        }

        let uploads = Arc::new(AtomicU64::new(0));
        mock.reply_with(UPLOAD_PATH, move |body, bearer| {
            if bearer.is_none() {
                return Ok(json_response(401, &json!({"message": "missing token"})));
            }
            let n = uploads.fetch_add(1, Ordering::SeqCst) + 1;
            let name = body.get("file_name").and_then(Value::as_str).unwrap_or("document");
            Ok(json_response(
                200,
                &json!({"success": true, "url": format!("https://api.example.com/files/{n}/{name}")}),
            ))
        });
        mock
    }

    /// Always answer `path` with `status` and a JSON `body`.
    pub fn respond(&self, path: &str, status: u16, body: Value) -> &Self {
        let response = json_response(status, &body);
        self.reply_with(path, move |_, _| Ok(response.clone()))
    }

    /// Always fail requests to `path` without a response.
    pub fn fail(&self, path: &str, error: TransportError) -> &Self {
        self.reply_with(path, move |_, _| Err(error.clone()))
    }

    /// Answer `path` by calling `reply` with the request body and bearer.
    pub fn reply_with<F>(&self, path: &str, reply: F) -> &Self
    where
        F: Fn(&Value, Option<&str>) -> Result<TransportResponse, TransportError>
            + Send
            + Sync
            + 'static,
    {
        lock(&self.replies).insert(path.to_owned(), Arc::new(reply));
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        lock(&self.calls).clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    pub fn calls_to(&self, path: &str) -> Vec<RecordedCall> {
        lock(&self.calls)
            .iter()
            .filter(|c| c.path == path)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn post_json(
        &self,
        path: &str,
        body: &Value,
        bearer: Option<&str>,
    ) -> Result<TransportResponse, TransportError> {
        lock(&self.calls).push(RecordedCall {
            path: path.to_owned(),
            body: body.clone(),
            bearer: bearer.map(str::to_owned),
        });

        let reply = lock(&self.replies).get(path).cloned();
        match reply {
            Some(reply) => reply(body, bearer),
            None => Err(TransportError::Connect(format!("no route to {path}"))),
        }
    }
}

fn json_response(status: u16, body: &Value) -> TransportResponse {
    TransportResponse {
        status,
        body: body.to_string().into_bytes(),
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
