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

use lapse_core::{DeviceClock, TimerError, TimerResult};
use std::sync::mpsc;

/// Size in bytes of one resolved timestamp.
const TIMESTAMP_SIZE: wgpu::BufferAddress = 8;

/// A single timestamp marker.
///
/// Layout: one-slot query set -> resolve buffer -> `MAP_READ` staging buffer.
/// The staging buffer is only mapped for the duration of a read, so dropping
/// an event in any state releases its resources without panicking.
#[derive(Debug)]
pub struct WgpuTimestampEvent {
    query_set: wgpu::QuerySet,
    resolve_buffer: wgpu::Buffer,
    staging_buffer: wgpu::Buffer,
}

/// WgpuTimestampClock records timestamps on the default queue of a `wgpu` device.
///
/// Timestamps are written between submissions with
/// `CommandEncoder::write_timestamp`, which needs both
/// `TIMESTAMP_QUERY` and `TIMESTAMP_QUERY_INSIDE_ENCODERS`.
#[derive(Debug)]
pub struct WgpuTimestampClock {
    device: wgpu::Device,
    queue: wgpu::Queue,
    period_ns: f32,
}

impl WgpuTimestampClock {
    /// Features a device must expose to back this clock.
    pub fn required_features() -> wgpu::Features {
        wgpu::Features::TIMESTAMP_QUERY | wgpu::Features::TIMESTAMP_QUERY_INSIDE_ENCODERS
    }

    /// Checks if the required features for encoder timestamps are available.
    pub fn feature_available(features: wgpu::Features) -> bool {
        features.contains(Self::required_features())
    }

    /// Requests a default adapter and a dedicated logical device for timing.
    pub fn request() -> TimerResult<Self> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor::new_without_display_handle());
        let adapter =
            pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions::default()))
                .map_err(|e| TimerError::BackendUnavailable(format!("no adapter: {e}")))?;

        let info = adapter.get_info();
        if !Self::feature_available(adapter.features()) {
            return Err(TimerError::BackendUnavailable(format!(
                "adapter \"{}\" lacks encoder timestamp queries",
                info.name
            )));
        }

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("Lapse Timestamp Device"),
            required_features: Self::required_features(),
            ..Default::default()
        }))
        .map_err(|e| TimerError::BackendUnavailable(format!("device request failed: {e}")))?;

        log::info!(
            "Using adapter \"{}\" (Backend: {:?}) for device timers.",
            info.name,
            info.backend
        );
        Self::from_device(device, queue)
    }

    /// Wraps an existing device and its queue.
    ///
    /// The device must have been created with [`Self::required_features`].
    pub fn from_device(device: wgpu::Device, queue: wgpu::Queue) -> TimerResult<Self> {
        if !Self::feature_available(device.features()) {
            return Err(TimerError::BackendUnavailable(
                "device was created without encoder timestamp queries".to_owned(),
            ));
        }
        let period_ns = queue.get_timestamp_period();
        log::info!("Device timestamp period is {:.3} ns.", period_ns);
        Ok(Self {
            device,
            queue,
            period_ns,
        })
    }

    /// Nanoseconds per timestamp tick.
    pub fn period_ns(&self) -> f32 {
        self.period_ns
    }

    /// The device timestamps are recorded on, for submitting the timed work.
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    /// The queue timestamps are submitted to. Work must go through it to be bracketed.
    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    fn wait_idle(&self) -> TimerResult<()> {
        self.device
            .poll(wgpu::PollType::wait_indefinitely())
            .map(|_| ())
            .map_err(|e| TimerError::DeviceTiming(format!("device poll failed: {e:?}")))
    }

    /// Maps the staging buffer of `event` and decodes its timestamp.
    fn read_ticks(&self, event: &WgpuTimestampEvent) -> TimerResult<u64> {
        let slice = event.staging_buffer.slice(..);
        let (sender, receiver) = mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });

        if let Err(e) = self.wait_idle() {
            event.staging_buffer.unmap();
            return Err(e);
        }

        match receiver.try_recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                return Err(TimerError::DeviceTiming(format!(
                    "timestamp readback failed: {e:?}"
                )));
            }
            Err(_) => {
                event.staging_buffer.unmap();
                return Err(TimerError::DeviceTiming(
                    "timestamp readback did not complete".to_owned(),
                ));
            }
        }

        let data = slice.get_mapped_range();
        let ticks: u64 = bytemuck::pod_read_unaligned(&data[..TIMESTAMP_SIZE as usize]);
        drop(data); // The view must be released before unmapping.
        event.staging_buffer.unmap();
        Ok(ticks)
    }
}

impl DeviceClock for WgpuTimestampClock {
    type Event = WgpuTimestampEvent;

    fn create_event(&self) -> TimerResult<Self::Event> {
        let query_set = self.device.create_query_set(&wgpu::QuerySetDescriptor {
            label: Some("Lapse Timestamp QuerySet"),
            ty: wgpu::QueryType::Timestamp,
            count: 1,
        });
        let resolve_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Lapse Timestamp Resolve Buffer"),
            size: TIMESTAMP_SIZE,
            usage: wgpu::BufferUsages::QUERY_RESOLVE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });
        let staging_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Lapse Timestamp Staging Buffer"),
            size: TIMESTAMP_SIZE,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        Ok(WgpuTimestampEvent {
            query_set,
            resolve_buffer,
            staging_buffer,
        })
    }

    fn record(&self, event: &Self::Event) -> TimerResult<()> {
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Lapse Timestamp Encoder"),
            });
        encoder.write_timestamp(&event.query_set, 0);
        encoder.resolve_query_set(&event.query_set, 0..1, &event.resolve_buffer, 0);
        encoder.copy_buffer_to_buffer(
            &event.resolve_buffer,
            0,
            &event.staging_buffer,
            0,
            TIMESTAMP_SIZE,
        );
        self.queue.submit(std::iter::once(encoder.finish()));
        Ok(())
    }

    fn synchronize(&self, _event: &Self::Event) -> TimerResult<()> {
        // Submissions complete in order, so an idle queue implies the event is written.
        self.wait_idle()
    }

    fn elapsed_between(&self, begin: &Self::Event, end: &Self::Event) -> TimerResult<f64> {
        let begin_ticks = self.read_ticks(begin)?;
        let end_ticks = self.read_ticks(end)?;
        if end_ticks < begin_ticks {
            log::warn!(
                "Device timestamps out of order ({begin_ticks} > {end_ticks}); reporting zero."
            );
        }
        let ticks = end_ticks.saturating_sub(begin_ticks);
        Ok(ticks as f64 * f64::from(self.period_ns) * 1e-9)
    }
}
