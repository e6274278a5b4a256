//! NVS (Non-Volatile Storage) adapter.
//!
//! Implements [`ConfigPort`] by storing the [`DoorConfig`] as one postcard
//! blob under `garagedoor::doorcfg`.  The door state itself is never
//! persisted; it is re-derived from the contacts at every start.
//!
//! - Validation runs before every save and after every load, so a blob
//!   written by an older firmware with looser ranges is rejected.
//! - ESP-IDF NVS commits are atomic per `nvs_commit()`.
//! - Host builds use an in-memory blob.

use log::info;
#[cfg(feature = "espidf")]
use log::warn;

use crate::app::ports::ConfigPort;
use crate::config::DoorConfig;
use crate::error::ConfigError;

#[cfg(feature = "espidf")]
use esp_idf_svc::sys::{
    ESP_ERR_NVS_NEW_VERSION_FOUND, ESP_ERR_NVS_NO_FREE_PAGES, ESP_ERR_NVS_NOT_FOUND, ESP_OK,
    nvs_close, nvs_commit, nvs_erase_key, nvs_flash_erase, nvs_flash_init, nvs_get_blob,
    nvs_handle_t, nvs_open, nvs_open_mode_t_NVS_READONLY, nvs_open_mode_t_NVS_READWRITE,
    nvs_set_blob,
};

#[cfg(feature = "espidf")]
const CONFIG_NAMESPACE: &[u8] = b"garagedoor\0";
#[cfg(feature = "espidf")]
const CONFIG_KEY: &[u8] = b"doorcfg\0";
#[cfg(feature = "espidf")]
const MAX_BLOB_SIZE: usize = 512;

pub struct NvsAdapter {
    #[cfg(not(feature = "espidf"))]
    blob: std::sync::Mutex<Option<Vec<u8>>>,
}

impl NvsAdapter {
    /// Initialise NVS flash.  On a full partition or a version mismatch the
    /// partition is erased and re-initialised.
    #[cfg(feature = "espidf")]
    pub fn new() -> Result<Self, ConfigError> {
        // SAFETY: called once from the main task before any other NVS access.
        let ret = unsafe { nvs_flash_init() };
        if ret == ESP_ERR_NVS_NO_FREE_PAGES || ret == ESP_ERR_NVS_NEW_VERSION_FOUND {
            warn!("NVS: erasing and re-initialising flash partition");
            // SAFETY: as above.
            if unsafe { nvs_flash_erase() } != ESP_OK || unsafe { nvs_flash_init() } != ESP_OK {
                return Err(ConfigError::IoError);
            }
        } else if ret != ESP_OK {
            return Err(ConfigError::IoError);
        }
        info!("NVS: ESP-IDF backend initialised");
        Ok(Self {})
    }

    #[cfg(not(feature = "espidf"))]
    pub fn new() -> Result<Self, ConfigError> {
        info!("NVS: simulation backend");
        Ok(Self {
            blob: std::sync::Mutex::new(None),
        })
    }

    /// Overwrite the stored blob verbatim (simulation only).
    #[cfg(not(feature = "espidf"))]
    pub fn write_raw(&self, bytes: &[u8]) {
        *self.sim_blob() = Some(bytes.to_vec());
    }

    #[cfg(not(feature = "espidf"))]
    fn sim_blob(&self) -> std::sync::MutexGuard<'_, Option<Vec<u8>>> {
        self.blob
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Remove the stored config (factory reset).
    pub fn erase(&self) -> Result<(), ConfigError> {
        #[cfg(not(feature = "espidf"))]
        {
            *self.sim_blob() = None;
            Ok(())
        }

        #[cfg(feature = "espidf")]
        {
            Self::with_handle(true, |h| {
                // SAFETY: `h` is an open read-write handle; key is null-terminated.
                let ret = unsafe { nvs_erase_key(h, CONFIG_KEY.as_ptr().cast()) };
                if ret != ESP_OK && ret != ESP_ERR_NVS_NOT_FOUND {
                    return Err(ret);
                }
                // SAFETY: as above.
                match unsafe { nvs_commit(h) } {
                    ESP_OK => Ok(()),
                    e => Err(e),
                }
            })
            .map_err(|_| ConfigError::IoError)
        }
    }

    fn decode(bytes: &[u8]) -> Result<DoorConfig, ConfigError> {
        let cfg: DoorConfig = postcard::from_bytes(bytes).map_err(|_| ConfigError::Corrupted)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Open the config namespace, run `f` with the handle, then close it.
    #[cfg(feature = "espidf")]
    fn with_handle<T>(
        write: bool,
        f: impl FnOnce(nvs_handle_t) -> Result<T, i32>,
    ) -> Result<T, i32> {
        let mode = if write {
            nvs_open_mode_t_NVS_READWRITE
        } else {
            nvs_open_mode_t_NVS_READONLY
        };
        let mut handle: nvs_handle_t = 0;
        // SAFETY: namespace is null-terminated; `handle` outlives the call.
        let ret = unsafe { nvs_open(CONFIG_NAMESPACE.as_ptr().cast(), mode, &mut handle) };
        if ret != ESP_OK {
            return Err(ret);
        }
        let result = f(handle);
        // SAFETY: `handle` was opened above and is closed exactly once.
        unsafe { nvs_close(handle) };
        result
    }
}

impl ConfigPort for NvsAdapter {
    fn load(&self) -> Result<DoorConfig, ConfigError> {
        #[cfg(not(feature = "espidf"))]
        {
            match self.sim_blob().as_deref() {
                Some(bytes) => {
                    let cfg = Self::decode(bytes)?;
                    info!("NVS: loaded config (simulation, {} bytes)", bytes.len());
                    Ok(cfg)
                }
                None => Err(ConfigError::NotFound),
            }
        }

        #[cfg(feature = "espidf")]
        {
            let result = Self::with_handle(false, |h| {
                let mut size: usize = 0;
                // SAFETY: a null buffer asks NVS for the blob size only.
                let ret = unsafe {
                    nvs_get_blob(h, CONFIG_KEY.as_ptr().cast(), core::ptr::null_mut(), &mut size)
                };
                if ret != ESP_OK {
                    return Err(ret);
                }
                if size == 0 || size > MAX_BLOB_SIZE {
                    return Err(ESP_ERR_NVS_NOT_FOUND);
                }
                let mut buf = vec![0u8; size];
                // SAFETY: `buf` holds exactly `size` bytes.
                let ret = unsafe {
                    nvs_get_blob(h, CONFIG_KEY.as_ptr().cast(), buf.as_mut_ptr().cast(), &mut size)
                };
                if ret != ESP_OK {
                    return Err(ret);
                }
                Ok(buf)
            });
            match result {
                Ok(bytes) => {
                    let cfg = Self::decode(&bytes)?;
                    info!("NVS: loaded config ({} bytes)", bytes.len());
                    Ok(cfg)
                }
                Err(ESP_ERR_NVS_NOT_FOUND) => Err(ConfigError::NotFound),
                Err(e) => {
                    warn!("NVS: read error {}", e);
                    Err(ConfigError::IoError)
                }
            }
        }
    }

    fn save(&self, config: &DoorConfig) -> Result<(), ConfigError> {
        config.validate()?;
        let bytes = postcard::to_allocvec(config).map_err(|_| ConfigError::IoError)?;

        #[cfg(not(feature = "espidf"))]
        {
            let len = bytes.len();
            *self.sim_blob() = Some(bytes);
            info!("NVS: config saved (simulation, {} bytes)", len);
            Ok(())
        }

        #[cfg(feature = "espidf")]
        {
            let result = Self::with_handle(true, |h| {
                // SAFETY: `bytes` is valid for its full length during the call.
                let ret = unsafe {
                    nvs_set_blob(h, CONFIG_KEY.as_ptr().cast(), bytes.as_ptr().cast(), bytes.len())
                };
                if ret != ESP_OK {
                    return Err(ret);
                }
                // SAFETY: `h` is an open read-write handle.
                match unsafe { nvs_commit(h) } {
                    ESP_OK => Ok(()),
                    e => Err(e),
                }
            });
            match result {
                Ok(()) => {
                    info!("NVS: config saved ({} bytes)", bytes.len());
                    Ok(())
                }
                Err(e) => {
                    warn!("NVS: write error {}", e);
                    Err(ConfigError::IoError)
                }
            }
        }
    }
}
