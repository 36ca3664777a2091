//! ST7735S command opcodes, register flags and the power-on tables.

/// Controller commands used by this driver
#[allow(non_camel_case_types, clippy::upper_case_acronyms)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Instruction {
    /// Sleep out
    SLPOUT = 0x11,
    /// Display on
    DISPON = 0x29,
    /// Column address set
    CASET = 0x2A,
    /// Row address set
    RASET = 0x2B,
    /// Memory (RAM) write
    RAMWR = 0x2C,
    /// Memory data access control
    MADCTL = 0x36,
    /// Interface pixel format
    COLMOD = 0x3A,
    /// Frame rate control, normal mode
    FRMCTR1 = 0xB1,
    /// Frame rate control, idle mode
    FRMCTR2 = 0xB2,
    /// Frame rate control, partial mode
    FRMCTR3 = 0xB3,
    /// Display inversion control
    INVCTR = 0xB4,
    PWCTR1 = 0xC0,
    PWCTR2 = 0xC1,
    PWCTR3 = 0xC2,
    PWCTR4 = 0xC3,
    PWCTR5 = 0xC4,
    /// VCOM control
    VMCTR1 = 0xC5,
    /// Positive gamma correction
    GMCTRP1 = 0xE0,
    /// Negative gamma correction
    GMCTRN1 = 0xE1,
}

/// Controller id reported in the [`DisplayDescriptor`](crate::DisplayDescriptor)
pub const CONTROLLER_ID: u16 = 0x7735;

/// Memory data access control (MADCTL) bits
pub mod madctl_flags {
    /// Row address order (MY)
    pub const ROW_ORDER: u8 = 1 << 7;
    /// Column address order (MX)
    pub const COLUMN_ORDER: u8 = 1 << 6;
    /// Row/column exchange (MV)
    pub const ROW_COLUMN_EXCHANGE: u8 = 1 << 5;
    /// Vertical refresh order (ML)
    pub const VERTICAL_REFRESH: u8 = 1 << 4;
    /// BGR color filter panel order
    pub const BGR: u8 = 1 << 3;
}

/// Interface pixel format (COLMOD) values
pub mod colmod_flags {
    /// 16 bit/pixel, RGB565
    pub const RGB565: u8 = 0x05;
}

/// Sleep-out needs this long before the next command, in ms
pub const SLEEP_OUT_DELAY_MS: u32 = 120;
/// Reset is held low this long, in ms
pub const RESET_LOW_MS: u32 = 100;
/// Settle time after releasing reset, in ms
pub const RESET_SETTLE_MS: u32 = 50;

/// Register writes issued after sleep-out and before the orientation is applied.
///
/// Frame rate, inversion, power and gamma values for the 1.8" ST7735S module.
pub const INIT_SEQUENCE: &[(Instruction, &[u8])] = &[
    (Instruction::FRMCTR1, &[0x05, 0x3C, 0x3C]),
    (Instruction::FRMCTR2, &[0x05, 0x3C, 0x3C]),
    (Instruction::FRMCTR3, &[0x05, 0x3C, 0x3C, 0x05, 0x3C, 0x3C]),
    // dot inversion
    (Instruction::INVCTR, &[0x03]),
    (Instruction::PWCTR1, &[0x28, 0x08, 0x04]),
    (Instruction::PWCTR2, &[0xC0]),
    (Instruction::PWCTR3, &[0x0D, 0x00]),
    (Instruction::PWCTR4, &[0x8D, 0x2A]),
    (Instruction::PWCTR5, &[0x8D, 0xEE]),
    (Instruction::VMCTR1, &[0x1A]),
    (
        Instruction::MADCTL,
        &[madctl_flags::ROW_ORDER | madctl_flags::COLUMN_ORDER],
    ),
    (
        Instruction::GMCTRP1,
        &[
            0x04, 0x22, 0x07, 0x0A, 0x2E, 0x30, 0x25, 0x2A, 0x28, 0x26, 0x2E, 0x3A, 0x00, 0x01,
            0x03, 0x13,
        ],
    ),
    (
        Instruction::GMCTRN1,
        &[
            0x04, 0x16, 0x06, 0x0D, 0x2D, 0x26, 0x23, 0x27, 0x27, 0x25, 0x2D, 0x3B, 0x00, 0x01,
            0x04, 0x13,
        ],
    ),
    (Instruction::COLMOD, &[colmod_flags::RGB565]),
];
