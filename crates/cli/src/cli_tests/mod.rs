// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

// Split test files for CLI parsing tests, one per category.

use super::*;
