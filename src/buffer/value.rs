//! 固定長整数のデコード・エンコードと、ユーザー入力のリテラル解析

use thiserror::Error;

/// 値の解釈に関するエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    #[error("invalid literal: {0:?}")]
    Parse(String),
    #[error("literal {0:?} does not fit in {1} bits")]
    OutOfRange(String, u32),
    #[error("{needed} bytes needed but only {available} available")]
    Unavailable { needed: usize, available: usize },
}

/// 整数の幅
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum IntWidth {
    #[default]
    W8,
    W16,
    W32,
    W64,
}

impl IntWidth {
    /// 幅コード（0..=3）。バイト数は `1 << code`
    pub fn code(self) -> u32 {
        match self {
            IntWidth::W8 => 0,
            IntWidth::W16 => 1,
            IntWidth::W32 => 2,
            IntWidth::W64 => 3,
        }
    }

    pub fn bytes(self) -> usize {
        1 << self.code()
    }

    pub fn bits(self) -> u32 {
        8 << self.code()
    }

    /// 一段狭い幅（8bitで止まる）
    pub fn narrower(self) -> Self {
        match self {
            IntWidth::W8 | IntWidth::W16 => IntWidth::W8,
            IntWidth::W32 => IntWidth::W16,
            IntWidth::W64 => IntWidth::W32,
        }
    }

    /// 一段広い幅（64bitで止まる）
    pub fn wider(self) -> Self {
        match self {
            IntWidth::W8 => IntWidth::W16,
            IntWidth::W16 => IntWidth::W32,
            IntWidth::W32 | IntWidth::W64 => IntWidth::W64,
        }
    }
}

/// `data` の先頭 `width` バイトを符号なし整数として読む
pub fn decode(data: &[u8], width: IntWidth, big_endian: bool) -> Result<u64, ValueError> {
    let needed = width.bytes();
    let Some(bytes) = data.get(..needed) else {
        return Err(ValueError::Unavailable {
            needed,
            available: data.len(),
        });
    };
    let fold = |acc: u64, &b: &u8| (acc << 8) | u64::from(b);
    Ok(if big_endian {
        bytes.iter().fold(0, fold)
    } else {
        bytes.iter().rev().fold(0, fold)
    })
}

/// 2の補数として符号拡張して読む
pub fn decode_signed(data: &[u8], width: IntWidth, big_endian: bool) -> Result<i64, ValueError> {
    let raw = decode(data, width, big_endian)?;
    let shift = 64 - width.bits();
    Ok(((raw << shift) as i64) >> shift)
}

/// 値を `width` バイトの列にする（上位ビットは切り捨て）
pub fn encode(value: u64, width: IntWidth, big_endian: bool) -> Vec<u8> {
    let mut bytes: Vec<u8> = (0..width.bytes()).map(|i| (value >> (8 * i)) as u8).collect();
    if big_endian {
        bytes.reverse();
    }
    bytes
}

/// 基数プレフィックスを取り除いて (基数, 数字部) を返す
///
/// `0x`/`0o`/`0b` と、先頭 `0` の8進数を受け付ける。プレフィックス付きなら `_` 区切りを許す。
fn split_radix(text: &str) -> (u32, String) {
    let lower = text.get(..2).map(str::to_ascii_lowercase);
    let (radix, digits) = match lower.as_deref() {
        Some("0x") => (16, &text[2..]),
        Some("0o") => (8, &text[2..]),
        Some("0b") => (2, &text[2..]),
        _ if text.len() > 1 && text.starts_with('0') => (8, &text[1..]),
        _ => return (10, text.to_string()),
    };
    (radix, digits.replace('_', ""))
}

/// 符号を外して絶対値を解析する
fn parse_magnitude(text: &str) -> Result<(bool, u64), ValueError> {
    let trimmed = text.trim();
    let (negative, body) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let (radix, digits) = split_radix(body);
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return Err(ValueError::Parse(text.to_string()));
    }
    let magnitude = u64::from_str_radix(&digits, radix)
        .map_err(|_| ValueError::OutOfRange(text.to_string(), 64))?;
    Ok((negative, magnitude))
}

/// 符号なし整数リテラルを `width` の範囲で解析
pub fn parse_unsigned(text: &str, width: IntWidth) -> Result<u64, ValueError> {
    let (negative, magnitude) = parse_magnitude(text)?;
    if negative {
        return Err(ValueError::Parse(text.to_string()));
    }
    let max = u64::MAX >> (64 - width.bits());
    if magnitude > max {
        return Err(ValueError::OutOfRange(text.to_string(), width.bits()));
    }
    Ok(magnitude)
}

/// 符号付き整数リテラルを `width` の範囲で解析
pub fn parse_signed(text: &str, width: IntWidth) -> Result<i64, ValueError> {
    let (negative, magnitude) = parse_magnitude(text)?;
    let limit = 1u64 << (width.bits() - 1);
    let out_of_range = || ValueError::OutOfRange(text.to_string(), width.bits());
    if negative {
        if magnitude > limit {
            return Err(out_of_range());
        }
        Ok((magnitude as i64).wrapping_neg())
    } else {
        if magnitude >= limit {
            return Err(out_of_range());
        }
        Ok(magnitude as i64)
    }
}

/// 2桁までのHEXバイトを解析（プレフィックスなし）
pub fn parse_hex_byte(text: &str) -> Result<u8, ValueError> {
    let trimmed = text.trim();
    if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ValueError::Parse(text.to_string()));
    }
    u8::from_str_radix(trimmed, 16).map_err(|_| ValueError::OutOfRange(text.to_string(), 8))
}
