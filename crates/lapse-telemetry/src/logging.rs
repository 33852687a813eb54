// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Logging bootstrap for binaries embedding lapse.

use env_logger::{Builder, Env};

fn builder() -> Builder {
    let mut builder = Builder::from_env(Env::default().default_filter_or("info"));
    builder
        .filter_module("wgpu_hal", log::LevelFilter::Error)
        .filter_module("wgpu_core", log::LevelFilter::Warn);
    builder
}

/// Installs `env_logger` as the global logger.
///
/// Honors `RUST_LOG`, defaults to `info`, and quiets the `wgpu` internals.
/// Panics if a logger is already installed.
pub fn init() {
    builder().init();
}

/// Same as [`init`], but returns an error instead of panicking when a logger
/// is already installed.
pub fn try_init() -> anyhow::Result<()> {
    builder().try_init()?;
    Ok(())
}
