//! TCA8418 register map and bit fields.
//!
//! Registers that come in banks of three cover the 18 keypad/GPIO lines:
//! bank 1 is ROW0-ROW7, bank 2 is COL0-COL7 and bank 3 is COL8-COL9.

/// 7-bit I2C address of the TCA8418.
pub const DEFAULT_ADDRESS: u8 = 0x34;

/// Depth of the on-chip key event FIFO.
pub const FIFO_DEPTH: u8 = 10;
/// Upper bound on pops while flushing the FIFO.
pub const FLUSH_LIMIT: u8 = 2 * FIFO_DEPTH;

// --- Register Addresses ---
pub const CFG: u8 = 0x01;
pub const INT_STAT: u8 = 0x02;
pub const KEY_LCK_EC: u8 = 0x03;
pub const KEY_EVENT_A: u8 = 0x04;

pub const GPIO_INT_EN: [u8; 3] = [0x1A, 0x1B, 0x1C];
pub const KP_GPIO: [u8; 3] = [0x1D, 0x1E, 0x1F];
pub const GPI_EM: [u8; 3] = [0x20, 0x21, 0x22];
pub const GPIO_DIR: [u8; 3] = [0x23, 0x24, 0x25];
pub const GPIO_INT_LVL: [u8; 3] = [0x26, 0x27, 0x28];
pub const DEBOUNCE_DIS: [u8; 3] = [0x29, 0x2A, 0x2B];

// --- Bitmasks for CFG ---
pub const CFG_AI: u8 = 0b1000_0000;
pub const CFG_GPI_E_CFG: u8 = 0b0100_0000;
pub const CFG_OVR_FLOW_M: u8 = 0b0010_0000;
pub const CFG_INT_CFG: u8 = 0b0001_0000;
pub const CFG_OVR_FLOW_IEN: u8 = 0b0000_1000;
pub const CFG_K_LCK_IEN: u8 = 0b0000_0100;
pub const CFG_GPI_IEN: u8 = 0b0000_0010;
pub const CFG_KE_IEN: u8 = 0b0000_0001;

// --- Bitmasks for INT_STAT ---
pub const INT_STAT_CAD: u8 = 0b0001_0000;
pub const INT_STAT_OVR_FLOW: u8 = 0b0000_1000;
pub const INT_STAT_K_LCK: u8 = 0b0000_0100;
pub const INT_STAT_GPI: u8 = 0b0000_0010;
pub const INT_STAT_K: u8 = 0b0000_0001;

// --- Bitmasks for KEY_LCK_EC ---
pub const KEY_LCK_EC_COUNT_MASK: u8 = 0b0000_1111;

// --- Bitmasks for KEY_EVENT_A ---
pub const KEY_EVENT_PRESSED: u8 = 0b1000_0000;
pub const KEY_EVENT_CODE_MASK: u8 = 0b0111_1111;

/// Flags latched in the INT_STAT register.
///
/// Each flag is cleared by writing a 1 back to its bit, see
/// [`Tca8418::clear_interrupts`](crate::Tca8418::clear_interrupts).
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct InterruptStatus {
    inner: u8,
}

impl core::fmt::Debug for InterruptStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("InterruptStatus")
            .field("ctrl_alt_del", &self.ctrl_alt_del())
            .field("overflow", &self.overflow())
            .field("key_lock", &self.key_lock())
            .field("gpi", &self.gpi())
            .field("key_event", &self.key_event())
            .finish()
    }
}

impl From<u8> for InterruptStatus {
    fn from(val: u8) -> Self {
        Self { inner: val }
    }
}

impl From<InterruptStatus> for u8 {
    fn from(val: InterruptStatus) -> Self {
        val.inner
    }
}

impl InterruptStatus {
    /// Only the key event flag, used to acknowledge a serviced key interrupt.
    pub const KEY_EVENT: Self = Self { inner: INT_STAT_K };

    /// Every flag, used to clear all pending interrupts.
    pub const ALL: Self = Self {
        inner: INT_STAT_CAD | INT_STAT_OVR_FLOW | INT_STAT_K_LCK | INT_STAT_GPI | INT_STAT_K,
    };

    /// The CTRL-ALT-DEL key sequence was detected.
    pub fn ctrl_alt_del(self) -> bool {
        self.inner & INT_STAT_CAD > 0
    }

    /// A key event arrived while the FIFO was full.
    pub fn overflow(self) -> bool {
        self.inner & INT_STAT_OVR_FLOW > 0
    }

    /// Keypad lock interrupt.
    pub fn key_lock(self) -> bool {
        self.inner & INT_STAT_K_LCK > 0
    }

    /// GPI interrupt.
    pub fn gpi(self) -> bool {
        self.inner & INT_STAT_GPI > 0
    }

    /// At least one key event is waiting in the FIFO.
    pub fn key_event(self) -> bool {
        self.inner & INT_STAT_K > 0
    }
}
