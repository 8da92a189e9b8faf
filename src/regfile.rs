//! The SerDes register file: 16-bit registers at byte addresses, each split into named fields.
//!
//! The catalog is a table fixed at build time.  `FieldId` names every entry, classification tags
//! are worked out from the field names while the table is built, and a `const` assertion refuses
//! to build a catalog with bad bit ranges, oversized reset values or overlapping fields.
use std::ops::RangeInclusive;
use std::sync::OnceLock;

use crate::error::Error;

/// How software may touch a field
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessMode {
    ReadOnly,
    ReadWrite,
    /// Writing 1 starts an action and the hardware clears the bit again
    WriteSelfClearing,
    /// Sticky status bit, cleared by the read that returns it
    ReadSelfClearing,
}

impl AccessMode {
    /// Whether the bits are driven by the hardware rather than by register writes
    pub const fn is_status(self) -> bool {
        matches!(self, AccessMode::ReadOnly | AccessMode::ReadSelfClearing)
    }
}

/// Which way a field's value is judged, from its name
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Policy {
    Neutral,
    /// Done / present / locked / aligned / enable style flags: good when set
    Positive,
    /// Error flags and counters: bad when non-zero
    Negative,
}

const POSITIVE: [&str; 7] = [
    "DONE",
    "PRESENT",
    "LOCKED",
    "IS_ALIGNED",
    "EN_ADPLL_CTRL",
    "CONFIG_SEL",
    "SERDES_ENABLE",
];
const NEGATIVE: [&str; 1] = ["ERR"];

const fn contains(haystack: &str, needle: &str) -> bool {
    let h = haystack.as_bytes();
    let n = needle.as_bytes();
    let mut i = 0;
    while i + n.len() <= h.len() {
        let mut j = 0;
        while j < n.len() && h[i + j] == n[j] {
            j += 1;
        }
        if j == n.len() {
            return true;
        }
        i += 1;
    }
    false
}

const fn contains_any(name: &str, words: &[&str]) -> bool {
    let mut k = 0;
    while k < words.len() {
        if contains(name, words[k]) {
            return true;
        }
        k += 1;
    }
    false
}

/// Positive words win over negative ones.
pub const fn policy(name: &str) -> Policy {
    if contains_any(name, &POSITIVE) {
        Policy::Positive
    } else if contains_any(name, &NEGATIVE) {
        Policy::Negative
    } else {
        Policy::Neutral
    }
}

/// How a decoded value should be presented
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Classification {
    Neutral,
    Nominal,
    Attention,
    Alert,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Field {
    pub id: FieldId,
    pub name: &'static str,
    pub address: u8,
    pub high_bit: u8,
    pub low_bit: u8,
    pub mode: AccessMode,
    pub reset_value: u16,
    pub policy: Policy,
}

impl Field {
    pub const fn new(
        id: FieldId,
        name: &'static str,
        address: u8,
        high_bit: u8,
        low_bit: u8,
        mode: AccessMode,
        reset_value: u16,
    ) -> Self {
        Self {
            id,
            name,
            address,
            high_bit,
            low_bit,
            mode,
            reset_value,
            policy: policy(name),
        }
    }

    pub const fn width(&self) -> u8 {
        self.high_bit.saturating_sub(self.low_bit) + 1
    }

    /// Largest value the field can hold
    pub const fn max_value(&self) -> u16 {
        ((1u32 << self.width()) - 1) as u16
    }

    /// The field's bits within its register word
    pub const fn mask(&self) -> u16 {
        self.max_value() << self.low_bit
    }

    /// Whether the field is something a design sets, rather than something it reports
    pub const fn is_configurable(&self) -> bool {
        !matches!(self.mode, AccessMode::ReadOnly)
    }

    const fn has_valid_range(&self) -> bool {
        self.low_bit <= self.high_bit && self.high_bit <= 15
    }
}

macro_rules! mode {
    (R) => {
        AccessMode::ReadOnly
    };
    (RW) => {
        AccessMode::ReadWrite
    };
    (WC) => {
        AccessMode::WriteSelfClearing
    };
    (RC) => {
        AccessMode::ReadSelfClearing
    };
}

macro_rules! catalog {
    ($($id:ident: $name:literal, $addr:literal, $mode:ident, $hi:literal, $lo:literal, $reset:literal;)*) => {
        /// Every field of the register file, in catalog order
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum FieldId {
            $($id,)*
        }

        /// name, address, mode, high bit, low bit, reset value
        pub const CATALOG: &[Field] = &[
            $(Field::new(FieldId::$id, $name, $addr, $hi, $lo, mode!($mode), $reset),)*
        ];
    };
}

catalog! {
    RxBufResetTime: "RX_BUF_RESET_TIME", 0x00, RW, 4, 0, 3;
    RxPcsResetTime: "RX_PCS_RESET_TIME", 0x00, RW, 9, 5, 3;
    RxResetTimerPresc: "RX_RESET_TIMER_PRESC", 0x00, RW, 14, 10, 0;
    RxResetDoneGate: "RX_RESET_DONE_GATE", 0x00, RW, 15, 15, 0;
    RxCdrResetTime: "RX_CDR_RESET_TIME", 0x01, RW, 4, 0, 3;
    RxEqaResetTime: "RX_EQA_RESET_TIME", 0x01, RW, 9, 5, 3;
    RxPmaResetTime: "RX_PMA_RESET_TIME", 0x01, RW, 14, 10, 3;
    RxWaitCdrLock: "RX_WAIT_CDR_LOCK", 0x01, RW, 15, 15, 0;
    RxCalibEn: "RX_CALIB_EN", 0x02, WC, 0, 0, 0;
    RxCalibDone: "RX_CALIB_DONE", 0x02, R, 1, 1, 1;
    RxCalibOvr: "RX_CALIB_OVR", 0x02, RW, 2, 2, 0;
    RxCalibVal: "RX_CALIB_VAL", 0x02, RW, 6, 3, 0;
    RxCalibCal: "RX_CALIB_CAL", 0x02, R, 10, 7, 0;
    RxRtermVcmsel: "RX_RTERM_VCMSEL", 0x02, RW, 13, 11, 4;
    RxRtermPd: "RX_RTERM_PD", 0x02, RW, 14, 14, 0;
    RxEqaCkpLf: "RX_EQA_CKP_LF", 0x03, RW, 7, 0, 0xA3;
    RxEqaCkpHf: "RX_EQA_CKP_HF", 0x03, RW, 15, 8, 0xA3;
    RxEqaCkpOffset: "RX_EQA_CKP_OFFSET", 0x04, RW, 7, 0, 1;
    RxEnEqa: "RX_EN_EQA", 0x04, RW, 8, 8, 0;
    RxEqaLockCfg: "RX_EQA_LOCK_CFG", 0x04, RW, 12, 9, 0;
    RxEqaLocked: "RX_EQA_LOCKED", 0x04, R, 13, 13, 0;
    RxThMon1: "RX_TH_MON1", 0x05, RW, 4, 0, 8;
    RxEnEqaExtValue0: "RX_EN_EQA_EXT_VALUE[0]", 0x05, RW, 5, 5, 0;
    RxThMon2: "RX_TH_MON2", 0x05, RW, 10, 6, 8;
    RxEnEqaExtValue1: "RX_EN_EQA_EXT_VALUE[1]", 0x05, RW, 11, 11, 0;
    RxTapw: "RX_TAPW", 0x06, RW, 4, 0, 8;
    RxEnEqaExtValue2: "RX_EN_EQA_EXT_VALUE[2]", 0x06, RW, 5, 5, 0;
    RxAfeOffset: "RX_AFE_OFFSET", 0x06, RW, 10, 6, 8;
    RxEnEqaExtValue3: "RX_EN_EQA_EXT_VALUE[3]", 0x06, RW, 11, 11, 0;
    RxEqaTapw: "RX_EQA_TAPW", 0x07, R, 4, 0, 0;
    RxThMon: "RX_TH_MON", 0x07, R, 9, 5, 0;
    RxOffset: "RX_OFFSET", 0x07, R, 13, 10, 0;
    RxEqaConfig: "RX_EQA_CONFIG", 0x08, RW, 15, 0, 0x1C0;
    RxAfePeak: "RX_AFE_PEAK", 0x09, RW, 4, 0, 15;
    RxAfeGain: "RX_AFE_GAIN", 0x09, RW, 8, 5, 8;
    RxAfeVcmsel: "RX_AFE_VCMSEL", 0x09, RW, 11, 9, 4;
    RxCdrCkp: "RX_CDR_CKP", 0x0a, RW, 7, 0, 0xF8;
    RxCdrCki: "RX_CDR_CKI", 0x0a, RW, 15, 8, 0;
    RxCdrTransTh: "RX_CDR_TRANS_TH", 0x0b, RW, 8, 0, 128;
    RxCdrLockCfg: "RX_CDR_LOCK_CFG", 0x0b, RW, 14, 9, 0xB;
    RxCdrLocked: "RX_CDR_LOCKED", 0x0b, R, 15, 15, 0;
    RxCdrFreqAccVal: "RX_CDR_FREQ_ACC_VAL", 0x0c, R, 14, 0, 0;
    RxCdrPhaseAccVal: "RX_CDR_PHASE_ACC_VAL", 0x0d, R, 15, 0, 0;
    RxCdrFreqAcc: "RX_CDR_FREQ_ACC", 0x0e, RW, 14, 0, 0;
    RxCdrPhaseAcc: "RX_CDR_PHASE_ACC", 0x0f, RW, 15, 0, 0;
    RxCdrSetAccConfig: "RX_CDR_SET_ACC_CONFIG", 0x10, RW, 1, 0, 0;
    RxCdrForceLock: "RX_CDR_FORCE_LOCK", 0x10, RW, 2, 2, 0;
    RxAlignMcommaValue: "RX_ALIGN_MCOMMA_VALUE", 0x11, RW, 9, 0, 0x283;
    RxMcommaAlignOvr: "RX_MCOMMA_ALIGN_OVR", 0x11, RW, 10, 10, 0;
    RxMcommaAlign: "RX_MCOMMA_ALIGN", 0x11, RW, 11, 11, 0;
    RxAlignPcommaValue: "RX_ALIGN_PCOMMA_VALUE", 0x12, RW, 9, 0, 0x17C;
    RxPcommaAlignOvr: "RX_PCOMMA_ALIGN_OVR", 0x12, RW, 10, 10, 0;
    RxPcommaAlign: "RX_PCOMMA_ALIGN", 0x12, RW, 11, 11, 0;
    RxAlignCommaWord: "RX_ALIGN_COMMA_WORD", 0x12, RW, 13, 12, 0;
    RxAlignCommaEnable: "RX_ALIGN_COMMA_ENABLE", 0x13, RW, 9, 0, 0x3FF;
    RxSlideMode: "RX_SLIDE_MODE", 0x13, RW, 11, 10, 0;
    RxCommaDetectEnOvr: "RX_COMMA_DETECT_EN_OVR", 0x13, RW, 12, 12, 0;
    RxCommaDetectEn: "RX_COMMA_DETECT_EN", 0x13, RW, 13, 13, 0;
    RxSlide0: "RX_SLIDE[0]", 0x13, RW, 14, 14, 0;
    RxSlide1: "RX_SLIDE[1]", 0x13, WC, 15, 15, 0;
    RxEyeMeasEn: "RX_EYE_MEAS_EN", 0x14, WC, 0, 0, 0;
    RxEyeMeasCfg: "RX_EYE_MEAS_CFG", 0x14, RW, 15, 1, 0;
    RxMonPhOffset: "RX_MON_PH_OFFSET", 0x15, RW, 5, 0, 0;
    RxEyeMeasCorrect11s: "RX_EYE_MEAS_CORRECT_11S", 0x16, R, 15, 0, 0;
    RxEyeMeasWrong11s: "RX_EYE_MEAS_WRONG_11S", 0x17, R, 15, 0, 0;
    RxEyeMeasCorrect00s: "RX_EYE_MEAS_CORRECT_00S", 0x18, R, 15, 0, 0;
    RxEyeMeasWrong00s: "RX_EYE_MEAS_WRONG_00S", 0x19, R, 15, 0, 0;
    RxEyeMeasCorrect001s: "RX_EYE_MEAS_CORRECT_001S", 0x1a, R, 15, 0, 0;
    RxEyeMeasWrong001s: "RX_EYE_MEAS_WRONG_001S", 0x1b, R, 15, 0, 0;
    RxEyeMeasCorrect110s: "RX_EYE_MEAS_CORRECT_110S", 0x1c, R, 15, 0, 0;
    RxEyeMeasWrong110s: "RX_EYE_MEAS_WRONG_110S", 0x1d, R, 15, 0, 0;
    RxEiBias: "RX_EI_BIAS", 0x1e, RW, 3, 0, 4;
    RxEiBwSel: "RX_EI_BW_SEL", 0x1e, RW, 7, 4, 4;
    RxEnEiDetectorOvr: "RX_EN_EI_DETECTOR_OVR", 0x1e, RW, 8, 8, 0;
    RxEnEiDetector: "RX_EN_EI_DETECTOR", 0x1e, RW, 9, 9, 0;
    RxEiEn: "RX_EI_EN", 0x1e, R, 10, 10, 0;
    RxPrbsErrCnt: "RX_PRBS_ERR_CNT", 0x1f, R, 14, 0, 0;
    RxPrbsLocked: "RX_PRBS_LOCKED", 0x1f, R, 15, 15, 0;
    RxDataSel: "RX_DATA_SEL", 0x20, RW, 0, 0, 0;
    RxData0: "RX_DATA[15:0]", 0x20, R, 15, 0, 0;
    RxData16: "RX_DATA[31:16]", 0x21, R, 15, 0, 0;
    RxData32: "RX_DATA[47:32]", 0x22, R, 15, 0, 0;
    RxData48: "RX_DATA[63:48]", 0x23, R, 15, 0, 0;
    RxData64: "RX_DATA[79:64]", 0x24, R, 15, 0, 0;
    RxBufBypass: "RX_BUF_BYPASS", 0x25, RW, 0, 0, 0;
    RxClkcorUse: "RX_CLKCOR_USE", 0x25, RW, 1, 1, 0;
    RxClkcorMinLat: "RX_CLKCOR_MIN_LAT", 0x25, RW, 7, 2, 32;
    RxClkcorMaxLat: "RX_CLKCOR_MAX_LAT", 0x25, RW, 13, 8, 39;
    RxClkcorSeq10: "RX_CLKCOR_SEQ_1_0", 0x26, RW, 9, 0, 0x1F7;
    RxClkcorSeq11: "RX_CLKCOR_SEQ_1_1", 0x27, RW, 9, 0, 0x1F7;
    RxClkcorSeq12: "RX_CLKCOR_SEQ_1_2", 0x28, RW, 9, 0, 0x1F7;
    RxClkcorSeq13: "RX_CLKCOR_SEQ_1_3", 0x29, RW, 9, 0, 0x1F7;
    RxPmaLoopback: "RX_PMA_LOOPBACK", 0x2a, RW, 0, 0, 0;
    RxPcsLoopback: "RX_PCS_LOOPBACK", 0x2a, RW, 1, 1, 0;
    RxDatapathSel: "RX_DATAPATH_SEL", 0x2a, RW, 3, 2, 3;
    RxPrbsOvr: "RX_PRBS_OVR", 0x2a, RW, 4, 4, 0;
    RxPrbsSel: "RX_PRBS_SEL", 0x2a, RW, 7, 5, 0;
    RxLoopbackOvr: "RX_LOOPBACK_OVR", 0x2a, RW, 8, 8, 0;
    RxPrbsCntReset: "RX_PRBS_CNT_RESET", 0x2a, WC, 9, 9, 0;
    RxPowerDownOvr: "RX_POWER_DOWN_OVR", 0x2a, RW, 10, 10, 0;
    RxPowerDownN: "RX_POWER_DOWN_N", 0x2a, RW, 11, 11, 0;
    RxPresent: "RX_PRESENT", 0x2a, R, 12, 12, 0;
    RxDetectDone: "RX_DETECT_DONE", 0x2a, R, 13, 13, 0;
    RxBufErr: "RX_BUF_ERR", 0x2a, R, 14, 14, 0;
    RxResetOvr: "RX_RESET_OVR", 0x2b, RW, 0, 0, 0;
    RxReset: "RX_RESET", 0x2b, WC, 1, 1, 0;
    RxPmaResetOvr: "RX_PMA_RESET_OVR", 0x2b, RW, 2, 2, 0;
    RxPmaReset: "RX_PMA_RESET", 0x2b, WC, 3, 3, 0;
    RxEqaResetOvr: "RX_EQA_RESET_OVR", 0x2b, RW, 4, 4, 0;
    RxEqaReset: "RX_EQA_RESET", 0x2b, WC, 5, 5, 0;
    RxCdrResetOvr: "RX_CDR_RESET_OVR", 0x2b, RW, 6, 6, 0;
    RxCdrReset: "RX_CDR_RESET", 0x2b, WC, 7, 7, 0;
    RxPcsResetOvr: "RX_PCS_RESET_OVR", 0x2b, RW, 8, 8, 0;
    RxPcsReset: "RX_PCS_RESET", 0x2b, WC, 9, 9, 0;
    RxBufResetOvr: "RX_BUF_RESET_OVR", 0x2b, RW, 10, 10, 0;
    RxBufReset: "RX_BUF_RESET", 0x2b, WC, 11, 11, 0;
    RxPolarityOvr: "RX_POLARITY_OVR", 0x2b, RW, 12, 12, 0;
    RxPolarity: "RX_POLARITY", 0x2b, RW, 13, 13, 0;
    Rx8b10bEnOvr: "RX_8B10B_EN_OVR", 0x2b, RW, 14, 14, 0;
    Rx8b10bEn: "RX_8B10B_EN", 0x2b, RW, 15, 15, 0;
    Rx8b10bBypass: "RX_8B10B_BYPASS", 0x2c, RW, 7, 0, 0;
    RxByteIsAligned: "RX_BYTE_IS_ALIGNED", 0x2c, R, 8, 8, 0;
    RxByteRealign: "RX_BYTE_REALIGN", 0x2c, RC, 9, 9, 0;
    RxResetDone: "RX_RESET_DONE", 0x2c, R, 10, 10, 0;
    TxSelPre: "TX_SEL_PRE", 0x30, RW, 4, 0, 0;
    TxSelPost: "TX_SEL_POST", 0x30, RW, 9, 5, 0;
    TxAmp: "TX_AMP", 0x30, RW, 14, 10, 15;
    TxBranchEnPre: "TX_BRANCH_EN_PRE", 0x31, RW, 4, 0, 0;
    TxBranchEnMain: "TX_BRANCH_EN_MAIN", 0x31, RW, 10, 5, 0x3F;
    TxBranchEnPost: "TX_BRANCH_EN_POST", 0x31, RW, 15, 11, 0;
    TxTailCascode: "TX_TAIL_CASCODE", 0x32, RW, 2, 0, 4;
    TxDcEnable: "TX_DC_ENABLE", 0x32, RW, 9, 3, 63;
    TxDcOffset: "TX_DC_OFFSET", 0x32, RW, 14, 10, 8;
    TxCmRaise: "TX_CM_RAISE", 0x33, RW, 4, 0, 0;
    TxCmThreshold0: "TX_CM_THRESHOLD_0", 0x33, RW, 9, 5, 14;
    TxCmThreshold1: "TX_CM_THRESHOLD_1", 0x33, RW, 14, 10, 16;
    TxSelPreEi: "TX_SEL_PRE_EI", 0x34, RW, 4, 0, 0;
    TxSelPostEi: "TX_SEL_POST_EI", 0x34, RW, 9, 5, 0;
    TxAmpEi: "TX_AMP_EI", 0x34, RW, 14, 10, 15;
    TxBranchEnPreEi: "TX_BRANCH_EN_PRE_EI", 0x35, RW, 4, 0, 0;
    TxBranchEnMainEi: "TX_BRANCH_EN_MAIN_EI", 0x35, RW, 10, 5, 0x3F;
    TxBranchEnPostEi: "TX_BRANCH_EN_POST_EI", 0x35, RW, 15, 11, 0;
    TxTailCascodeEi: "TX_TAIL_CASCODE_EI", 0x36, RW, 2, 0, 4;
    TxDcEnableEi: "TX_DC_ENABLE_EI", 0x36, RW, 9, 3, 63;
    TxDcOffsetEi: "TX_DC_OFFSET_EI", 0x36, RW, 14, 10, 0;
    TxCmRaiseEi: "TX_CM_RAISE_EI", 0x37, RW, 4, 0, 0;
    TxCmThreshold0Ei: "TX_CM_THRESHOLD_0_EI", 0x37, RW, 9, 5, 14;
    TxCmThreshold1Ei: "TX_CM_THRESHOLD_1_EI", 0x37, RW, 14, 10, 16;
    TxSelPreRxdet: "TX_SEL_PRE_RXDET", 0x38, RW, 4, 0, 0;
    TxSelPostRxdet: "TX_SEL_POST_RXDET", 0x38, RW, 9, 5, 0;
    TxAmpRxdet: "TX_AMP_RXDET", 0x38, RW, 14, 10, 15;
    TxBranchEnPreRxdet: "TX_BRANCH_EN_PRE_RXDET", 0x39, RW, 4, 0, 0;
    TxBranchEnMainRxdet: "TX_BRANCH_EN_MAIN_RXDET", 0x39, RW, 10, 5, 0x3F;
    TxBranchEnPostRxdet: "TX_BRANCH_EN_POST_RXDET", 0x39, RW, 15, 11, 0;
    TxTailCascodeRxdet: "TX_TAIL_CASCODE_RXDET", 0x3a, RW, 2, 0, 4;
    TxDcEnableRxdet: "TX_DC_ENABLE_RXDET", 0x3a, RW, 9, 3, 63;
    TxDcOffsetRxdet: "TX_DC_OFFSET_RXDET", 0x3a, RW, 14, 10, 0;
    TxCmRaiseRxdet: "TX_CM_RAISE_RXDET", 0x3b, RW, 4, 0, 0;
    TxCmThreshold0Rxdet: "TX_CM_THRESHOLD_0_RXDET", 0x3b, RW, 9, 5, 14;
    TxCmThreshold1Rxdet: "TX_CM_THRESHOLD_1_RXDET", 0x3b, RW, 14, 10, 16;
    TxCalibEn: "TX_CALIB_EN", 0x3c, WC, 0, 0, 0;
    TxCalibDone: "TX_CALIB_DONE", 0x3c, R, 1, 1, 1;
    TxCalibOvr: "TX_CALIB_OVR", 0x3c, RW, 2, 2, 0;
    TxCalibVal: "TX_CALIB_VAL", 0x3c, RW, 6, 3, 0;
    TxCalibCal: "TX_CALIB_CAL", 0x3c, R, 10, 7, 0;
    TxCmRegKi: "TX_CM_REG_KI", 0x3d, RW, 7, 0, 0x80;
    TxCmSarEn: "TX_CM_SAR_EN", 0x3d, RW, 8, 8, 0;
    TxCmRegEn: "TX_CM_REG_EN", 0x3d, RW, 9, 9, 1;
    TxCmSarResult0: "TX_CM_SAR_RESULT_0", 0x3e, R, 4, 0, 0;
    TxCmSarResult1: "TX_CM_SAR_RESULT_1", 0x3e, R, 9, 5, 0;
    TxPmaResetTime: "TX_PMA_RESET_TIME", 0x3f, RW, 4, 0, 3;
    TxPcsResetTime: "TX_PCS_RESET_TIME", 0x3f, RW, 9, 5, 3;
    TxPcsResetOvr: "TX_PCS_RESET_OVR", 0x3f, RW, 10, 10, 0;
    TxPcsReset: "TX_PCS_RESET", 0x3f, WC, 11, 11, 0;
    TxPmaResetOvr: "TX_PMA_RESET_OVR", 0x3f, RW, 12, 12, 0;
    TxPmaReset: "TX_PMA_RESET", 0x3f, WC, 13, 13, 0;
    TxResetOvr: "TX_RESET_OVR", 0x3f, RW, 14, 14, 0;
    TxReset: "TX_RESET", 0x3f, WC, 15, 15, 0;
    TxPmaLoopback: "TX_PMA_LOOPBACK", 0x40, RW, 1, 0, 0;
    TxPcsLoopback: "TX_PCS_LOOPBACK", 0x40, RW, 2, 2, 0;
    TxDatapathSel: "TX_DATAPATH_SEL", 0x40, RW, 4, 3, 3;
    TxPrbsOvr: "TX_PRBS_OVR", 0x40, RW, 5, 5, 0;
    TxPrbsSel: "TX_PRBS_SEL", 0x40, RW, 8, 6, 0;
    TxPrbsForceErr: "TX_PRBS_FORCE_ERR", 0x40, WC, 9, 9, 0;
    TxLoopbackOvr: "TX_LOOPBACK_OVR", 0x40, RW, 10, 10, 0;
    TxPowerDownOvr: "TX_POWER_DOWN_OVR", 0x40, RW, 11, 11, 0;
    TxPowerDownN: "TX_POWER_DOWN_N", 0x40, RW, 12, 12, 0;
    TxElecIdleOvr: "TX_ELEC_IDLE_OVR", 0x41, RW, 0, 0, 0;
    TxElecIdle: "TX_ELEC_IDLE", 0x41, RW, 1, 1, 0;
    TxDetectRxOvr: "TX_DETECT_RX_OVR", 0x41, RW, 2, 2, 0;
    TxDetectRx: "TX_DETECT_RX", 0x41, RW, 3, 3, 0;
    TxPolarityOvr: "TX_POLARITY_OVR", 0x41, RW, 4, 4, 0;
    TxPolarity: "TX_POLARITY", 0x41, RW, 5, 5, 0;
    Tx8b10bEnOvr: "TX_8B10B_EN_OVR", 0x41, RW, 6, 6, 0;
    Tx8b10bEn: "TX_8B10B_EN", 0x41, RW, 7, 7, 0;
    TxDataOvr: "TX_DATA_OVR", 0x41, RW, 8, 8, 0;
    TxDataCnt: "TX_DATA_CNT", 0x41, RW, 11, 9, 0;
    TxDataValid: "TX_DATA_VALID", 0x41, WC, 12, 12, 0;
    TxBufErr: "TX_BUF_ERR", 0x41, R, 13, 13, 0;
    TxResetDone: "TX_RESET_DONE", 0x41, R, 14, 14, 0;
    TxData: "TX_DATA", 0x42, RW, 15, 0, 0;
    PllEnAdpllCtrl: "PLL_EN_ADPLL_CTRL", 0x50, RW, 0, 0, 0;
    PllConfigSel: "PLL_CONFIG_SEL", 0x50, RW, 1, 1, 1;
    PllSetOpLock: "PLL_SET_OP_LOCK", 0x50, RW, 2, 2, 0;
    PllEnforceLock: "PLL_ENFORCE_LOCK", 0x50, RW, 3, 3, 0;
    PllDisableLock: "PLL_DISABLE_LOCK", 0x50, RW, 4, 4, 0;
    PllLockWindow: "PLL_LOCK_WINDOW", 0x50, RW, 5, 5, 1;
    PllFastLock: "PLL_FAST_LOCK", 0x50, RW, 6, 6, 1;
    PllSyncBypass: "PLL_SYNC_BYPASS", 0x50, RW, 7, 7, 0;
    PllPfdSelect: "PLL_PFD_SELECT", 0x50, RW, 8, 8, 0;
    PllRefBypass: "PLL_REF_BYPASS", 0x50, RW, 9, 9, 0;
    PllRefSel: "PLL_REF_SEL", 0x50, RW, 10, 10, 1;
    PllRefRterm: "PLL_REF_RTERM", 0x50, RW, 11, 11, 1;
    PllFcntrl: "PLL_FCNTRL", 0x51, RW, 5, 0, 58;
    PllMainDivsel: "PLL_MAIN_DIVSEL", 0x51, RW, 11, 6, 27;
    PllOutDivsel: "PLL_OUT_DIVSEL", 0x51, RW, 13, 12, 0;
    PllCi: "PLL_CI", 0x52, RW, 4, 0, 3;
    PllCp: "PLL_CP", 0x52, RW, 14, 5, 80;
    PllAo: "PLL_AO", 0x53, RW, 3, 0, 0;
    PllScap: "PLL_SCAP", 0x53, RW, 6, 4, 0;
    PllFilterShift: "PLL_FILTER_SHIFT", 0x53, RW, 8, 7, 2;
    PllSarLimit: "PLL_SAR_LIMIT", 0x53, RW, 11, 9, 2;
    PllFt: "PLL_FT", 0x54, RW, 10, 0, 512;
    PllOpenLoop: "PLL_OPEN_LOOP", 0x54, RW, 11, 11, 0;
    PllScapAutoCal: "PLL_SCAP_AUTO_CAL", 0x54, RW, 12, 12, 1;
    PllLocked: "PLL_LOCKED", 0x55, R, 0, 0, 0;
    PllCapFtOf: "PLL_CAP_FT_OF", 0x55, R, 1, 1, 0;
    PllCapFtUf: "PLL_CAP_FT_UF", 0x55, R, 2, 2, 0;
    PllCapFt: "PLL_CAP_FT", 0x55, R, 12, 3, 0;
    PllCapState: "PLL_CAP_STATE", 0x55, R, 14, 13, 0;
    PllSyncValue: "PLL_SYNC_VALUE", 0x56, R, 7, 0, 0;
    PllBiscMode: "PLL_BISC_MODE", 0x57, RW, 2, 0, 4;
    PllBiscTimerMax: "PLL_BISC_TIMER_MAX", 0x57, RW, 6, 3, 15;
    PllBiscOptDetInd: "PLL_BISC_OPT_DET_IND", 0x57, RW, 7, 7, 0;
    PllBiscPfdSel: "PLL_BISC_PFD_SEL", 0x57, RW, 8, 8, 0;
    PllBiscDlyDir: "PLL_BISC_DLY_DIR", 0x57, RW, 9, 9, 0;
    PllBiscCorDly: "PLL_BISC_COR_DLY", 0x57, RW, 12, 10, 1;
    PllBiscCalSign: "PLL_BISC_CAL_SIGN", 0x57, RW, 13, 13, 0;
    PllBiscCalAuto: "PLL_BISC_CAL_AUTO", 0x57, RW, 14, 14, 1;
    PllBiscCpMin: "PLL_BISC_CP_MIN", 0x58, RW, 4, 0, 4;
    PllBiscCpMax: "PLL_BISC_CP_MAX", 0x58, RW, 9, 5, 18;
    PllBiscCpStart: "PLL_BISC_CP_START", 0x58, RW, 14, 10, 12;
    PllBiscDlyPfdMonRef: "PLL_BISC_DLY_PFD_MON_REF", 0x59, RW, 4, 0, 0;
    PllBiscDlyPfdMonDiv: "PLL_BISC_DLY_PFD_MON_DIV", 0x59, RW, 9, 5, 2;
    PllBiscTimerDone: "PLL_BISC_TIMER_DONE", 0x5a, R, 0, 0, 0;
    PllBiscCp: "PLL_BISC_CP", 0x5a, R, 7, 1, 0;
    PllBiscCo: "PLL_BISC_CO", 0x5b, R, 15, 0, 0;
    SerdesEnable: "SERDES_ENABLE", 0x5c, RW, 0, 0, 1;
    SerdesAutoInit: "SERDES_AUTO_INIT", 0x5c, RW, 1, 1, 0;
    SerdesTestmode: "SERDES_TESTMODE", 0x5c, RW, 2, 2, 0;
}

impl FieldId {
    pub fn field(self) -> &'static Field {
        &CATALOG[self as usize]
    }
}

/// Index of the first field that breaks the catalog rules, if any.  Status fields (read-only and
/// read-self-clearing) and writable fields are checked for overlap separately: a register may
/// report one thing and take a control bit in the same position.
const fn first_invalid(fields: &[Field]) -> Option<usize> {
    let mut status = [0u16; 256];
    let mut writable = [0u16; 256];
    let mut i = 0;
    while i < fields.len() {
        let f = &fields[i];
        if !f.has_valid_range() || f.reset_value & !f.max_value() != 0 {
            return Some(i);
        }
        let a = f.address as usize;
        let m = f.mask();
        if f.mode.is_status() {
            if status[a] & m != 0 {
                return Some(i);
            }
            status[a] |= m;
        } else {
            if writable[a] & m != 0 {
                return Some(i);
            }
            writable[a] |= m;
        }
        i += 1;
    }
    None
}

const _: () = assert!(first_invalid(CATALOG).is_none(), "register catalog is inconsistent");

/// Check a table of fields, naming the first offender.
pub fn validate(fields: &[Field]) -> Result<(), Error> {
    for (i, f) in fields.iter().enumerate() {
        if !f.has_valid_range() {
            return Err(Error::InvalidFieldRange {
                name: f.name,
                high: f.high_bit,
                low: f.low_bit,
            });
        }
        if f.reset_value > f.max_value() {
            return Err(Error::ResetValueTooWide {
                name: f.name,
                value: f.reset_value,
                width: f.width(),
            });
        }
        let clash = fields[..i].iter().find(|g| {
            g.address == f.address
                && g.mode.is_status() == f.mode.is_status()
                && g.mask() & f.mask() != 0
        });
        if let Some(g) = clash {
            return Err(Error::FieldOverlap {
                first: g.name,
                second: f.name,
                address: f.address,
            });
        }
    }
    Ok(())
}

/// Find a field by its register-map name, e.g. `RX_CDR_LOCKED` or `RX_DATA[15:0]`.
pub fn lookup(name: &str) -> Option<&'static Field> {
    CATALOG.iter().find(|f| f.name == name)
}

static BY_ADDRESS: OnceLock<Vec<Vec<&'static Field>>> = OnceLock::new();

/// Every field of the register at `address`, in catalog order.
pub fn fields_at(address: u8) -> &'static [&'static Field] {
    let index = BY_ADDRESS.get_or_init(|| {
        let mut index = vec![Vec::new(); 256];
        for field in CATALOG {
            index[field.address as usize].push(field);
        }
        index
    });
    &index[address as usize]
}

/// Bits `[low_bit, high_bit]` of `word`, shifted down.
pub fn field_value(word: u16, field: &Field) -> u16 {
    (word >> field.low_bit) & field.max_value()
}

pub fn interpret(field: &Field, value: u16) -> Classification {
    match (field.policy, value) {
        (Policy::Positive, 0) => Classification::Attention,
        (Policy::Positive, _) => Classification::Nominal,
        (Policy::Negative, 0) => Classification::Neutral,
        (Policy::Negative, _) => Classification::Alert,
        (Policy::Neutral, _) => Classification::Neutral,
    }
}

/// Addresses nothing lives at.  Scans skip them.
pub const RESERVED: RangeInclusive<u8> = 0x43..=0x4F;

pub fn is_reserved(address: u8) -> bool {
    RESERVED.contains(&address)
}

/// The address ranges the tool reads as a group
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Band {
    /// Receive path control and status
    RxControl,
    /// The five words of received data, inside the receive range
    RxData,
    Tx,
    /// PLL, plus the top-level enables at 0x5C
    Pll,
}

impl Band {
    pub fn addresses(self) -> RangeInclusive<u8> {
        match self {
            Band::RxControl => 0x00..=0x2F,
            Band::RxData => 0x20..=0x24,
            Band::Tx => 0x30..=0x42,
            Band::Pll => 0x50..=0x5C,
        }
    }
}
