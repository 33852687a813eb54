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

use anyhow::Result;
use lapse_core::{DeviceClock, TimerError, TimerId, TimerPool};
use lapse_infra::WgpuTimestampClock;
use lapse_telemetry::JsonReportEmitter;
use std::sync::Arc;

const ELEMENTS: usize = 4_000_000;

/// Adds a device timer, or a host timer when the device cannot time work.
fn add_stage_timer<C: DeviceClock + 'static>(
    pool: &mut TimerPool<C>,
    label: &str,
    data_size: usize,
    unit: &str,
) -> Result<TimerId> {
    match pool.add_device_timer(label, data_size, unit) {
        Ok(id) => Ok(id),
        Err(TimerError::BackendUnavailable(reason)) => {
            log::debug!("'{label}' falls back to the host clock: {reason}");
            Ok(pool.add_host_timer(label, data_size, unit))
        }
        Err(e) => Err(e.into()),
    }
}

fn run_pipeline<C, U>(pool: &mut TimerPool<C>, upload: U) -> Result<()>
where
    C: DeviceClock + 'static,
    U: FnOnce(&[f32]) -> Result<()>,
{
    let pipeline = pool.add_host_timer("pipeline", 0, "");

    let generate = pool.add_host_timer("generate", ELEMENTS, "elements");
    let samples: Vec<f32> = (0..ELEMENTS).map(|i| (i % 1024) as f32 * 0.5).collect();
    pool.stop(generate)?;

    let transform = pool.add_host_timer("transform", ELEMENTS, "elements");
    let scaled: Vec<f32> = samples.iter().map(|v| v.sqrt() * 1.5).collect();
    pool.stop(transform)?;

    let bytes = std::mem::size_of_val(scaled.as_slice());
    let upload_timer = add_stage_timer(pool, "upload", bytes, "bytes")?;
    upload(&scaled)?;
    pool.stop(upload_timer)?;

    let reduce = pool.add_host_timer("reduce", ELEMENTS, "elements");
    let checksum = {
        let _guard = pool.scoped_stop(reduce)?;
        scaled.iter().map(|v| f64::from(*v)).sum::<f64>()
    };
    log::info!("Pipeline checksum: {checksum:.3}");

    pool.stop(pipeline)?;
    Ok(())
}

/// Copies `data` into a fresh device buffer through the timed queue.
///
/// The staged write is flushed by the next submission, which is the one
/// carrying the stage's end timestamp.
fn upload_to_device(clock: &WgpuTimestampClock, data: &[f32]) -> Result<()> {
    let contents: &[u8] = bytemuck::cast_slice(data);
    let buffer = clock.device().create_buffer(&wgpu::BufferDescriptor {
        label: Some("Sandbox Upload Buffer"),
        size: contents.len() as wgpu::BufferAddress,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::STORAGE,
        mapped_at_creation: false,
    });
    clock.queue().write_buffer(&buffer, 0, contents);
    Ok(())
}

fn finish<C: DeviceClock + 'static>(pool: &TimerPool<C>) -> Result<()> {
    pool.flush()?;
    if std::env::var_os("LAPSE_JSON").is_some() {
        JsonReportEmitter::pretty().emit(&pool.report(), std::io::stdout().lock())?;
    }
    Ok(())
}

fn main() -> Result<()> {
    lapse_telemetry::logging::init();

    match WgpuTimestampClock::request() {
        Ok(clock) => {
            let clock = Arc::new(clock);
            let mut pool = TimerPool::with_device(clock.clone());
            run_pipeline(&mut pool, |data| upload_to_device(&clock, data))?;
            finish(&pool)
        }
        Err(e) => {
            log::warn!("Device timers unavailable ({e}); using host timers only.");
            let mut pool = TimerPool::new();
            run_pipeline(&mut pool, |data| {
                let staged = data.to_vec();
                log::debug!("Staged {} elements on the host.", staged.len());
                Ok(())
            })?;
            finish(&pool)
        }
    }
}
