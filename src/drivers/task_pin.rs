//! Core-pinned task spawning.
//!
//! ESP-IDF runs `std::thread` on pthreads over FreeRTOS tasks.
//! `esp_pthread_set_cfg()` configures the *next* `pthread_create()` issued
//! by the calling thread, so [`TaskSpec::spawn`] applies the config and
//! spawns back to back.  On host builds only the name and stack apply.

use std::io;
use std::thread::{Builder, JoinHandle};

use log::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum Core {
    /// PRO_CPU: WiFi and the bridge stack.
    Pro = 0,
    /// APP_CPU: door control and contact polling.
    App = 1,
}

/// Placement of one long-running task.
#[derive(Debug, Clone, Copy)]
pub struct TaskSpec {
    /// Null-terminated, e.g. `"door-poll\0"`.
    pub name: &'static str,
    pub core: Core,
    pub priority: u8,
    pub stack_kb: usize,
}

impl TaskSpec {
    fn label(&self) -> &'static str {
        self.name.trim_end_matches('\0')
    }

    fn builder(&self) -> Builder {
        Builder::new()
            .name(self.label().into())
            .stack_size(self.stack_kb * 1024)
    }

    #[cfg(feature = "espidf")]
    pub fn spawn<F>(&self, f: F) -> io::Result<JoinHandle<()>>
    where
        F: FnOnce() + Send + 'static,
    {
        use esp_idf_sys::{ESP_OK, esp_create_default_pthread_config, esp_pthread_set_cfg};

        // SAFETY: the config starts from the IDF defaults and `name` is a
        // 'static null-terminated string.
        let ret = unsafe {
            let mut cfg = esp_create_default_pthread_config();
            cfg.pin_to_core = self.core as i32;
            cfg.prio = self.priority as i32;
            cfg.stack_size = (self.stack_kb * 1024) as i32;
            cfg.thread_name = self.name.as_ptr().cast();
            esp_pthread_set_cfg(&cfg)
        };
        if ret != ESP_OK as i32 {
            return Err(io::Error::other(format!(
                "esp_pthread_set_cfg({}) failed: {ret}",
                self.label()
            )));
        }

        info!(
            "TASK: '{}' on {:?} (pri={}, stack={}KB)",
            self.label(),
            self.core,
            self.priority,
            self.stack_kb
        );
        self.builder().spawn(f)
    }

    #[cfg(not(feature = "espidf"))]
    pub fn spawn<F>(&self, f: F) -> io::Result<JoinHandle<()>>
    where
        F: FnOnce() + Send + 'static,
    {
        info!("TASK: '{}' (host thread, {}KB)", self.label(), self.stack_kb);
        self.builder().spawn(f)
    }
}
