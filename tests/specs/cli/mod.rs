// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

mod common;
mod drafts;
mod init;
mod status;
mod sync;
