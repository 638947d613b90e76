// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// snapdoc-sync: talks to the remote document service.
//
// `SyncClient` owns the request/response contract (credentials exchange and
// document upload); `Transport` is the wire underneath it. `HttpTransport`
// is the production wire, `MockTransport` an in-process one for tests.

pub mod client;
pub mod mock;
pub mod transport;

pub use client::{LOGIN_PATH, REGISTER_PATH, SyncClient, UPLOAD_PATH};
pub use mock::{MockTransport, RecordedCall};
pub use transport::{HttpTransport, Transport, TransportError, TransportResponse};
