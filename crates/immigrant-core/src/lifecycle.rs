use crate::error::DriverError;

/// Lifecycle of a driver's backend handle:
/// `Uninitialized -> Ready | Failed`, then `Ready -> Closed`.
#[derive(Debug)]
pub enum Lifecycle<T> {
    Uninitialized,
    Ready(T),
    Failed(String),
    Closed,
}

impl<T> Default for Lifecycle<T> {
    fn default() -> Self {
        Self::Uninitialized
    }
}

impl<T> Lifecycle<T> {
    /// Guard for `init`: only an uninitialized instance may be bound.
    pub fn ensure_uninitialized(&self) -> Result<(), DriverError> {
        match self {
            Self::Uninitialized => Ok(()),
            Self::Ready(_) => Err(DriverError::AlreadyInitialized),
            Self::Failed(reason) => Err(DriverError::Unusable(reason.clone())),
            Self::Closed => Err(DriverError::Closed),
        }
    }

    pub fn bind(&mut self, handle: T) {
        *self = Self::Ready(handle);
    }

    /// Mark the instance permanently unusable.
    pub fn fail(&mut self, reason: impl Into<String>) {
        *self = Self::Failed(reason.into());
    }

    pub fn ready(&self) -> Result<&T, DriverError> {
        match self {
            Self::Ready(handle) => Ok(handle),
            other => Err(other.not_ready()),
        }
    }

    pub fn ready_mut(&mut self) -> Result<&mut T, DriverError> {
        match self {
            Self::Ready(handle) => Ok(handle),
            other => Err(other.not_ready()),
        }
    }

    /// Transition to `Closed`, handing back the bound handle if there was one.
    pub fn close(&mut self) -> Option<T> {
        match std::mem::replace(self, Self::Closed) {
            Self::Ready(handle) => Some(handle),
            _ => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    fn not_ready(&self) -> DriverError {
        match self {
            Self::Uninitialized => DriverError::NotInitialized,
            Self::Failed(reason) => DriverError::Unusable(reason.clone()),
            Self::Closed => DriverError::Closed,
            Self::Ready(_) => unreachable!("ready lifecycle has a handle"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uninitialized_guards() {
        let mut lc: Lifecycle<u8> = Lifecycle::default();
        assert_eq!(lc.ready().unwrap_err(), DriverError::NotInitialized);
        assert_eq!(lc.ready_mut().unwrap_err(), DriverError::NotInitialized);
        assert!(lc.ensure_uninitialized().is_ok());
    }

    #[test]
    fn bind_then_close() {
        let mut lc = Lifecycle::default();
        lc.bind(7u8);
        assert!(lc.is_ready());
        assert_eq!(*lc.ready().unwrap(), 7);
        assert_eq!(lc.ensure_uninitialized().unwrap_err(), DriverError::AlreadyInitialized);

        assert_eq!(lc.close(), Some(7));
        assert_eq!(lc.ready().unwrap_err(), DriverError::Closed);
        // Closing again is a no-op.
        assert_eq!(lc.close(), None);
    }

    #[test]
    fn failed_is_permanent() {
        let mut lc: Lifecycle<u8> = Lifecycle::default();
        lc.fail("unable to open database");
        assert!(matches!(lc.ready(), Err(DriverError::Unusable(_))));
        assert!(matches!(lc.ensure_uninitialized(), Err(DriverError::Unusable(_))));
    }
}
