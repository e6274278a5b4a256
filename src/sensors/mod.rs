//! Sensor subsystem: end-stop contacts, the [`DoorSensors`] reader, and
//! the [`Debouncer`](debounce::Debouncer) that turns raw samples into
//! accepted positions.
//!
//! The reader produces a raw [`SensorSample`] on every poll.  Samples are
//! ephemeral: the service keeps only what the debouncer needs to compare
//! the next reading against.

pub mod contact;
pub mod debounce;

use embedded_hal::digital::InputPin;

use crate::config::SensorLayout;
use crate::error::SensorError;
use contact::ContactInput;

/// One raw reading of the end-stop contacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorSample {
    /// `true` = the "fully closed" contact is engaged.
    pub closed_contact: bool,
    /// `None` when no "fully open" contact is wired.
    pub open_contact: Option<bool>,
    /// Monotonic time of the read (milliseconds).
    pub timestamp_ms: u64,
}

/// Where the contacts place the door.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContactPosition {
    FullyClosed,
    FullyOpen,
    /// Neither end-stop engaged: travelling, stopped midway, or (with a
    /// closed-only layout) open.  Never a confirmation of `Open`.
    Between,
}

impl ContactPosition {
    /// Classify a raw sample.  Both contacts engaged at once is physically
    /// impossible and reported as a sensor fault.
    pub fn from_sample(sample: &SensorSample) -> Result<Self, SensorError> {
        match (sample.closed_contact, sample.open_contact) {
            (true, Some(true)) => Err(SensorError::ContactsConflict),
            (true, _) => Ok(Self::FullyClosed),
            (false, Some(true)) => Ok(Self::FullyOpen),
            (false, _) => Ok(Self::Between),
        }
    }
}

/// Sensor Reader: samples the wired contacts and reports the instantaneous
/// raw reading.  Never blocks longer than one GPIO read per contact.
pub struct DoorSensors<P: InputPin> {
    closed: Option<ContactInput<P>>,
    open: Option<ContactInput<P>>,
}

impl<P: InputPin> DoorSensors<P> {
    /// No contacts wired; the position is only ever assumed.
    pub fn none() -> Self {
        Self {
            closed: None,
            open: None,
        }
    }

    pub fn closed_only(closed: ContactInput<P>) -> Self {
        Self {
            closed: Some(closed),
            open: None,
        }
    }

    pub fn closed_and_open(closed: ContactInput<P>, open: ContactInput<P>) -> Self {
        Self {
            closed: Some(closed),
            open: Some(open),
        }
    }

    pub fn layout(&self) -> SensorLayout {
        match (&self.closed, &self.open) {
            (None, _) => SensorLayout::None,
            (Some(_), None) => SensorLayout::ClosedOnly,
            (Some(_), Some(_)) => SensorLayout::ClosedAndOpen,
        }
    }

    /// Read every wired contact.  An unwired closed contact reads as
    /// disengaged, which classifies as [`ContactPosition::Between`].
    pub fn read(&mut self, now_ms: u64) -> Result<SensorSample, SensorError> {
        let closed_contact = match self.closed.as_mut() {
            Some(c) => c.is_engaged()?,
            None => false,
        };
        let open_contact = match self.open.as_mut() {
            Some(c) => Some(c.is_engaged()?),
            None => None,
        };
        Ok(SensorSample {
            closed_contact,
            open_contact,
            timestamp_ms: now_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(closed: bool, open: Option<bool>) -> SensorSample {
        SensorSample {
            closed_contact: closed,
            open_contact: open,
            timestamp_ms: 0,
        }
    }

    #[test]
    fn classifies_two_contact_readings() {
        assert_eq!(
            ContactPosition::from_sample(&sample(true, Some(false))),
            Ok(ContactPosition::FullyClosed)
        );
        assert_eq!(
            ContactPosition::from_sample(&sample(false, Some(true))),
            Ok(ContactPosition::FullyOpen)
        );
        assert_eq!(
            ContactPosition::from_sample(&sample(false, Some(false))),
            Ok(ContactPosition::Between)
        );
        assert_eq!(
            ContactPosition::from_sample(&sample(true, Some(true))),
            Err(SensorError::ContactsConflict)
        );
    }

    #[test]
    fn closed_only_never_reports_open() {
        assert_eq!(
            ContactPosition::from_sample(&sample(false, None)),
            Ok(ContactPosition::Between)
        );
        assert_eq!(
            ContactPosition::from_sample(&sample(true, None)),
            Ok(ContactPosition::FullyClosed)
        );
    }
}
