//! Task Watchdog Timer (TWDT) driver.
//!
//! Resets the device if the supervising task stops feeding it.  The
//! timeout must comfortably exceed one relay pulse plus a sensor poll,
//! since the main task may wait on the controller lock for that long.
//!
//! On host builds this is a no-op.

#[cfg(feature = "espidf")]
use esp_idf_svc::sys::{
    ESP_OK, esp_task_wdt_add, esp_task_wdt_config_t, esp_task_wdt_reconfigure,
    esp_task_wdt_reset,
};
use log::info;
#[cfg(feature = "espidf")]
use log::warn;

pub struct Watchdog {
    timeout_ms: u32,
    subscribed: bool,
}

impl Watchdog {
    /// Configure the TWDT and subscribe the calling task.
    #[cfg(feature = "espidf")]
    pub fn new(timeout_ms: u32) -> Self {
        // SAFETY: plain FFI calls with a fully-initialised config struct;
        // a null task handle subscribes the calling task.
        let subscribed = unsafe {
            let cfg = esp_task_wdt_config_t {
                timeout_ms,
                idle_core_mask: 0,
                trigger_panic: true,
            };
            let ret = esp_task_wdt_reconfigure(&cfg);
            if ret != ESP_OK {
                warn!("WDT: reconfigure returned {} (may already be configured)", ret);
            }
            esp_task_wdt_add(core::ptr::null_mut()) == ESP_OK
        };
        if subscribed {
            info!("WDT: subscribed ({}ms timeout, panic on trigger)", timeout_ms);
        } else {
            warn!("WDT: failed to subscribe");
        }
        Self {
            timeout_ms,
            subscribed,
        }
    }

    #[cfg(not(feature = "espidf"))]
    pub fn new(timeout_ms: u32) -> Self {
        info!("WDT(sim): no-op, {}ms", timeout_ms);
        Self {
            timeout_ms,
            subscribed: false,
        }
    }

    pub fn feed(&self) {
        #[cfg(feature = "espidf")]
        if self.subscribed {
            // SAFETY: resets the TWDT entry of the calling (subscribed) task.
            unsafe {
                esp_task_wdt_reset();
            }
        }
    }

    pub fn timeout_ms(&self) -> u32 {
        self.timeout_ms
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscribed
    }
}
