//! 编辑值回解析：把用户输入的文本尽量还原为字面量值
//!
//! 只接受字面量（数字、带引号的字符串、列表、元组、字典、集合、`True`/`False`/`None`），
//! 不求值任何表达式。解析失败时 [`coerce`] 退化为原样字符串，错误不会外泄。

use thiserror::Error;

use crate::model::value::{OptionMap, OptionValue};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LiteralError {
    #[error("输入意外结束")]
    UnexpectedEnd,
    #[error("位置 {pos} 处的字符无法识别: {ch:?}")]
    UnexpectedChar { ch: char, pos: usize },
    #[error("位置 {pos} 处出现意外的记号: {found}")]
    UnexpectedToken { found: String, pos: usize },
    #[error("无效数字: {0}")]
    InvalidNumber(String),
    #[error("整数超出范围: {0}")]
    IntegerOverflow(String),
    #[error("字符串未闭合")]
    UnterminatedString,
    #[error("不支持的转义序列: \\{0}")]
    BadEscape(char),
    #[error("不是字面量: {0}")]
    NotALiteral(String),
    #[error("字典键必须是字符串: {0}")]
    UnsupportedKey(String),
    #[error("不可哈希的集合元素: {0}")]
    Unhashable(String),
    #[error("嵌套超过 {0} 层")]
    TooDeep(usize),
}

/// 容器与一元符号的最大嵌套层数
const MAX_DEPTH: usize = 128;

/// 解析编辑文本；成功返回 `(值, true)`，失败返回 `(去空白后的原文, false)`
pub fn coerce(text: &str) -> (OptionValue, bool) {
    let text = text.trim();
    match parse_literal(text) {
        Ok(value) => (value, true),
        Err(e) => {
            tracing::debug!("字面量解析失败，按字符串处理: {} ({})", text, e);
            (OptionValue::String(text.to_string()), false)
        }
    }
}

/// 严格解析单个字面量表达式
pub fn parse_literal(text: &str) -> Result<OptionValue, LiteralError> {
    let tokens = Lexer::new(text).tokenize()?;
    let mut parser = Parser { tokens, pos: 0, depth: 0 };
    let value = parser.top_level()?;
    match parser.peek() {
        Token::End => Ok(value),
        _ => Err(parser.unexpected()),
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Int(i128),
    Float(f64),
    Str(String),
    Name(String),
    Punct(char),
    End,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Int(i) => i.to_string(),
            Token::Float(x) => x.to_string(),
            Token::Str(s) => format!("{:?}", s),
            Token::Name(n) => n.clone(),
            Token::Punct(c) => c.to_string(),
            Token::End => "<end>".to_string(),
        }
    }
}

struct Lexer {
    chars: Vec<char>,
    pos: usize,
}

impl Lexer {
    fn new(src: &str) -> Self {
        Self { chars: src.chars().collect(), pos: 0 }
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn tokenize(mut self) -> Result<Vec<(Token, usize)>, LiteralError> {
        let mut out = Vec::new();
        loop {
            self.skip_trivia();
            let start = self.pos;
            let Some(c) = self.peek_at(0) else {
                out.push((Token::End, start));
                return Ok(out);
            };
            let token = match c {
                '[' | ']' | '(' | ')' | '{' | '}' | ',' | ':' | '+' | '-' => {
                    self.pos += 1;
                    Token::Punct(c)
                }
                '0'..='9' => self.number()?,
                '.' if self.peek_at(1).is_some_and(|d| d.is_ascii_digit()) => self.number()?,
                '\'' | '"' => Token::Str(self.string(false)?),
                c if c.is_alphabetic() || c == '_' => self.name_or_prefixed_string()?,
                c => return Err(LiteralError::UnexpectedChar { ch: c, pos: start }),
            };
            out.push((token, start));
        }
    }

    fn skip_trivia(&mut self) {
        while let Some(c) = self.peek_at(0) {
            if c.is_whitespace() {
                self.pos += 1;
            } else if c == '\\' && self.peek_at(1) == Some('\n') {
                self.pos += 2;
            } else if c == '#' {
                while self.peek_at(0).is_some_and(|c| c != '\n') {
                    self.pos += 1;
                }
            } else {
                break;
            }
        }
    }

    fn name_or_prefixed_string(&mut self) -> Result<Token, LiteralError> {
        let start = self.pos;
        while self.peek_at(0).is_some_and(|c| c.is_alphanumeric() || c == '_') {
            self.pos += 1;
        }
        let name: String = self.chars[start..self.pos].iter().collect();
        if matches!(self.peek_at(0), Some('\'') | Some('"')) {
            return match name.to_ascii_lowercase().as_str() {
                "r" => Ok(Token::Str(self.string(true)?)),
                "u" => Ok(Token::Str(self.string(false)?)),
                _ => Err(LiteralError::NotALiteral(format!("{}-string", name))),
            };
        }
        Ok(Token::Name(name))
    }

    fn number(&mut self) -> Result<Token, LiteralError> {
        let start = self.pos;
        if self.peek_at(0) == Some('0') {
            let radix = match self.peek_at(1) {
                Some('x') | Some('X') => Some(16),
                Some('o') | Some('O') => Some(8),
                Some('b') | Some('B') => Some(2),
                _ => None,
            };
            if let Some(radix) = radix {
                self.pos += 2;
                let digits = self.take_digits(|c| c.is_digit(radix));
                let text = self.slice(start);
                if digits.is_empty() || self.peek_at(0).is_some_and(|c| c.is_alphanumeric()) {
                    return Err(LiteralError::InvalidNumber(self.rest_of_word(start)));
                }
                return i128::from_str_radix(&digits, radix)
                    .map(Token::Int)
                    .map_err(|_| LiteralError::IntegerOverflow(text));
            }
        }

        let int_part = self.take_digits(|c| c.is_ascii_digit());
        let mut is_float = false;
        let mut literal = int_part.clone();
        if self.peek_at(0) == Some('.') {
            is_float = true;
            self.pos += 1;
            literal.push('.');
            literal.push_str(&self.take_digits(|c| c.is_ascii_digit()));
        }
        if matches!(self.peek_at(0), Some('e') | Some('E')) {
            let sign = self.peek_at(1);
            let digit_at = if matches!(sign, Some('+') | Some('-')) { 2 } else { 1 };
            if self.peek_at(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                is_float = true;
                literal.push('e');
                if digit_at == 2 {
                    literal.extend(sign);
                }
                self.pos += digit_at;
                literal.push_str(&self.take_digits(|c| c.is_ascii_digit()));
            }
        }
        // 10um、1j 之类的后缀都不是合法字面量
        if self.peek_at(0).is_some_and(|c| c.is_alphanumeric() || c == '_') {
            return Err(LiteralError::InvalidNumber(self.rest_of_word(start)));
        }
        let text = self.slice(start);
        if is_float {
            // 溢出为 inf 的浮点无法写回 JSON，保留原文
            return match literal.parse::<f64>() {
                Ok(x) if x.is_finite() => Ok(Token::Float(x)),
                _ => Err(LiteralError::InvalidNumber(text)),
            };
        }
        if int_part.len() > 1 && int_part.starts_with('0') && int_part.chars().any(|c| c != '0') {
            return Err(LiteralError::InvalidNumber(text));
        }
        int_part
            .parse::<i128>()
            .map(Token::Int)
            .map_err(|_| LiteralError::IntegerOverflow(text))
    }

    /// 读取一串数字，允许数字之间的单个下划线
    fn take_digits(&mut self, is_digit: impl Fn(char) -> bool) -> String {
        let mut digits = String::new();
        while let Some(c) = self.peek_at(0) {
            if is_digit(c) {
                digits.push(c);
                self.pos += 1;
            } else if c == '_'
                && !digits.is_empty()
                && self.peek_at(1).is_some_and(&is_digit)
            {
                self.pos += 1;
            } else {
                break;
            }
        }
        digits
    }

    fn slice(&self, start: usize) -> String {
        self.chars[start..self.pos].iter().collect()
    }

    fn rest_of_word(&mut self, start: usize) -> String {
        while self.peek_at(0).is_some_and(|c| c.is_alphanumeric() || c == '_' || c == '.') {
            self.pos += 1;
        }
        self.slice(start)
    }

    fn string(&mut self, raw: bool) -> Result<String, LiteralError> {
        let quote = self.peek_at(0).ok_or(LiteralError::UnexpectedEnd)?;
        let triple = self.peek_at(1) == Some(quote) && self.peek_at(2) == Some(quote);
        self.pos += if triple { 3 } else { 1 };
        let mut out = String::new();
        loop {
            let c = self.peek_at(0).ok_or(LiteralError::UnterminatedString)?;
            if c == quote {
                if !triple {
                    self.pos += 1;
                    return Ok(out);
                }
                if self.peek_at(1) == Some(quote) && self.peek_at(2) == Some(quote) {
                    self.pos += 3;
                    return Ok(out);
                }
            }
            if c == '\n' && !triple {
                return Err(LiteralError::UnterminatedString);
            }
            self.pos += 1;
            if c != '\\' {
                out.push(c);
                continue;
            }
            let esc = self.peek_at(0).ok_or(LiteralError::UnterminatedString)?;
            self.pos += 1;
            if raw {
                out.push('\\');
                out.push(esc);
                continue;
            }
            match esc {
                '\n' => {}
                '\\' => out.push('\\'),
                '\'' => out.push('\''),
                '"' => out.push('"'),
                'n' => out.push('\n'),
                't' => out.push('\t'),
                'r' => out.push('\r'),
                'a' => out.push('\u{07}'),
                'b' => out.push('\u{08}'),
                'f' => out.push('\u{0c}'),
                'v' => out.push('\u{0b}'),
                'x' => out.push(self.hex_escape(2, esc)?),
                'u' => out.push(self.hex_escape(4, esc)?),
                'U' => out.push(self.hex_escape(8, esc)?),
                '0'..='7' => {
                    let mut code = esc.to_digit(8).unwrap_or(0);
                    for _ in 0..2 {
                        match self.peek_at(0).and_then(|d| d.to_digit(8)) {
                            Some(d) => {
                                code = code * 8 + d;
                                self.pos += 1;
                            }
                            None => break,
                        }
                    }
                    out.push(char::from_u32(code).ok_or(LiteralError::BadEscape(esc))?);
                }
                'N' => return Err(LiteralError::BadEscape(esc)),
                other => {
                    out.push('\\');
                    out.push(other);
                }
            }
        }
    }

    fn hex_escape(&mut self, width: usize, esc: char) -> Result<char, LiteralError> {
        let mut code = 0u32;
        for _ in 0..width {
            let d = self
                .peek_at(0)
                .and_then(|c| c.to_digit(16))
                .ok_or(LiteralError::BadEscape(esc))?;
            code = code * 16 + d;
            self.pos += 1;
        }
        char::from_u32(code).ok_or(LiteralError::BadEscape(esc))
    }
}

struct Parser {
    tokens: Vec<(Token, usize)>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> &Token {
        self.tokens.get(self.pos).map(|(t, _)| t).unwrap_or(&Token::End)
    }

    fn next(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, c: char) -> bool {
        if *self.peek() == Token::Punct(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, c: char) -> Result<(), LiteralError> {
        if self.eat(c) {
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    fn unexpected(&self) -> LiteralError {
        match self.tokens.get(self.pos) {
            None | Some((Token::End, _)) => LiteralError::UnexpectedEnd,
            Some((t, pos)) => LiteralError::UnexpectedToken { found: t.describe(), pos: *pos },
        }
    }

    /// 顶层允许不带括号的元组：`1, 2`
    fn top_level(&mut self) -> Result<OptionValue, LiteralError> {
        let first = self.value()?;
        if !self.eat(',') {
            return Ok(first);
        }
        let mut items = vec![first];
        while *self.peek() != Token::End {
            items.push(self.value()?);
            if !self.eat(',') {
                break;
            }
        }
        Ok(OptionValue::Sequence(items))
    }

    fn value(&mut self) -> Result<OptionValue, LiteralError> {
        if self.depth >= MAX_DEPTH {
            return Err(LiteralError::TooDeep(MAX_DEPTH));
        }
        self.depth += 1;
        let value = self.atom();
        self.depth -= 1;
        value
    }

    fn atom(&mut self) -> Result<OptionValue, LiteralError> {
        match self.next() {
            Token::Int(i) => to_int(i),
            Token::Float(x) => Ok(OptionValue::Float(x)),
            Token::Str(mut s) => {
                // 相邻字符串字面量自动拼接
                while let Token::Str(more) = self.peek().clone() {
                    s.push_str(&more);
                    self.pos += 1;
                }
                Ok(OptionValue::String(s))
            }
            Token::Name(name) => self.name(name),
            Token::Punct('-') => self.signed(-1),
            Token::Punct('+') => self.signed(1),
            Token::Punct('[') => {
                let items = self.items(']')?;
                Ok(OptionValue::Sequence(items))
            }
            Token::Punct('(') => self.parenthesized(),
            Token::Punct('{') => self.braced(),
            Token::End => Err(LiteralError::UnexpectedEnd),
            _ => {
                self.pos -= 1;
                Err(self.unexpected())
            }
        }
    }

    fn name(&mut self, name: String) -> Result<OptionValue, LiteralError> {
        match name.as_str() {
            "True" => Ok(OptionValue::Bool(true)),
            "False" => Ok(OptionValue::Bool(false)),
            "None" => Ok(OptionValue::Null),
            "set" if *self.peek() == Token::Punct('(') => {
                self.pos += 1;
                self.expect(')')?;
                Ok(OptionValue::Sequence(Vec::new()))
            }
            _ => Err(LiteralError::NotALiteral(name)),
        }
    }

    /// 一元正负号只作用于数字（可叠加：`--1`）
    fn signed(&mut self, sign: i64) -> Result<OptionValue, LiteralError> {
        match self.peek().clone() {
            Token::Int(i) => {
                self.pos += 1;
                to_int(i * sign as i128)
            }
            Token::Float(x) => {
                self.pos += 1;
                Ok(OptionValue::Float(x * sign as f64))
            }
            Token::Punct('-') | Token::Punct('+') => match self.value()? {
                OptionValue::Int(i) => i
                    .checked_mul(sign)
                    .map(OptionValue::Int)
                    .ok_or_else(|| LiteralError::IntegerOverflow(i.to_string())),
                OptionValue::Float(x) => Ok(OptionValue::Float(x * sign as f64)),
                other => Err(LiteralError::NotALiteral(format!("-{}", other))),
            },
            _ => Err(self.unexpected()),
        }
    }

    /// 逗号分隔的元素列表，允许末尾逗号
    fn items(&mut self, close: char) -> Result<Vec<OptionValue>, LiteralError> {
        let mut items = Vec::new();
        loop {
            if self.eat(close) {
                return Ok(items);
            }
            items.push(self.value()?);
            if !self.eat(',') {
                self.expect(close)?;
                return Ok(items);
            }
        }
    }

    fn parenthesized(&mut self) -> Result<OptionValue, LiteralError> {
        if self.eat(')') {
            return Ok(OptionValue::Sequence(Vec::new()));
        }
        let first = self.value()?;
        if self.eat(')') {
            return Ok(first);
        }
        self.expect(',')?;
        let mut items = vec![first];
        items.extend(self.items(')')?);
        Ok(OptionValue::Sequence(items))
    }

    fn braced(&mut self) -> Result<OptionValue, LiteralError> {
        if self.eat('}') {
            return Ok(OptionValue::Mapping(OptionMap::new()));
        }
        let first = self.value()?;
        if self.eat(':') {
            let mut map = OptionMap::new();
            let value = self.value()?;
            map.insert(dict_key(first)?, value);
            while self.eat(',') {
                if self.eat('}') {
                    return Ok(OptionValue::Mapping(map));
                }
                let key = self.value()?;
                self.expect(':')?;
                let value = self.value()?;
                map.insert(dict_key(key)?, value);
            }
            self.expect('}')?;
            return Ok(OptionValue::Mapping(map));
        }

        let mut items = vec![first];
        if self.eat(',') {
            items.extend(self.items('}')?);
        } else {
            self.expect('}')?;
        }
        let mut unique: Vec<OptionValue> = Vec::with_capacity(items.len());
        for item in items {
            if matches!(item, OptionValue::Sequence(_) | OptionValue::Mapping(_)) {
                return Err(LiteralError::Unhashable(item.repr()));
            }
            if !unique.contains(&item) {
                unique.push(item);
            }
        }
        Ok(OptionValue::Sequence(unique))
    }
}

fn to_int(i: i128) -> Result<OptionValue, LiteralError> {
    i64::try_from(i)
        .map(OptionValue::Int)
        .map_err(|_| LiteralError::IntegerOverflow(i.to_string()))
}

fn dict_key(key: OptionValue) -> Result<String, LiteralError> {
    match key {
        OptionValue::String(s) => Ok(s),
        other => Err(LiteralError::UnsupportedKey(other.repr())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seq(items: Vec<OptionValue>) -> OptionValue {
        OptionValue::Sequence(items)
    }

    #[test]
    fn test_coerce_basic_cases() {
        assert_eq!(coerce("42"), (OptionValue::Int(42), true));
        assert_eq!(coerce("[1, 2, 3]"), (seq(vec![1.into(), 2.into(), 3.into()]), true));
        assert_eq!(coerce("hello"), (OptionValue::from("hello"), false));
        assert_eq!(coerce("'hello'"), (OptionValue::from("hello"), true));
    }

    #[test]
    fn test_coerce_trims_and_falls_back() {
        assert_eq!(coerce("  7 "), (OptionValue::Int(7), true));
        assert_eq!(coerce("  10um "), (OptionValue::from("10um"), false));
        assert_eq!(coerce(""), (OptionValue::from(""), false));
        assert_eq!(coerce("[1, 2"), (OptionValue::from("[1, 2"), false));
    }

    #[test]
    fn test_numbers() {
        assert_eq!(parse_literal("-5").unwrap(), OptionValue::Int(-5));
        assert_eq!(parse_literal("--5").unwrap(), OptionValue::Int(5));
        assert_eq!(parse_literal("1_000").unwrap(), OptionValue::Int(1000));
        assert_eq!(parse_literal("0x1F").unwrap(), OptionValue::Int(31));
        assert_eq!(parse_literal("0b101").unwrap(), OptionValue::Int(5));
        assert_eq!(parse_literal("0o17").unwrap(), OptionValue::Int(15));
        assert_eq!(parse_literal("1.5").unwrap(), OptionValue::Float(1.5));
        assert_eq!(parse_literal(".5").unwrap(), OptionValue::Float(0.5));
        assert_eq!(parse_literal("3.").unwrap(), OptionValue::Float(3.0));
        assert_eq!(parse_literal("2e3").unwrap(), OptionValue::Float(2000.0));
        assert_eq!(parse_literal("-1.5E-2").unwrap(), OptionValue::Float(-0.015));
        assert_eq!(
            parse_literal("-9223372036854775808").unwrap(),
            OptionValue::Int(i64::MIN)
        );
    }

    #[test]
    fn test_invalid_numbers() {
        assert!(matches!(parse_literal("007"), Err(LiteralError::InvalidNumber(_))));
        assert!(matches!(parse_literal("1j"), Err(LiteralError::InvalidNumber(_))));
        assert!(matches!(
            parse_literal("99999999999999999999"),
            Err(LiteralError::IntegerOverflow(_))
        ));
        assert_eq!(parse_literal("00").unwrap(), OptionValue::Int(0));
    }

    #[test]
    fn test_strings() {
        assert_eq!(parse_literal(r#""a\tb""#).unwrap(), OptionValue::from("a\tb"));
        assert_eq!(parse_literal(r#"r'a\tb'"#).unwrap(), OptionValue::from("a\\tb"));
        assert_eq!(parse_literal("'a' \"b\"").unwrap(), OptionValue::from("ab"));
        assert_eq!(parse_literal("'''x'y'''").unwrap(), OptionValue::from("x'y"));
        assert_eq!(parse_literal(r"'\x41é'").unwrap(), OptionValue::from("Aé"));
        assert_eq!(parse_literal("'unterminated"), Err(LiteralError::UnterminatedString));
        assert!(parse_literal("b'bytes'").is_err());
        assert!(parse_literal("f'{x}'").is_err());
    }

    #[test]
    fn test_keywords_and_names() {
        assert_eq!(parse_literal("True").unwrap(), OptionValue::Bool(true));
        assert_eq!(parse_literal("False").unwrap(), OptionValue::Bool(false));
        assert_eq!(parse_literal("None").unwrap(), OptionValue::Null);
        assert_eq!(parse_literal("set()").unwrap(), seq(vec![]));
        assert_eq!(parse_literal("true"), Err(LiteralError::NotALiteral("true".into())));
        assert!(parse_literal("__import__('os')").is_err());
        assert!(parse_literal("1 + 2").is_err());
    }

    #[test]
    fn test_tuples_and_sets() {
        assert_eq!(parse_literal("()").unwrap(), seq(vec![]));
        assert_eq!(parse_literal("(1)").unwrap(), OptionValue::Int(1));
        assert_eq!(parse_literal("(1,)").unwrap(), seq(vec![1.into()]));
        assert_eq!(parse_literal("1, 'a'").unwrap(), seq(vec![1.into(), "a".into()]));
        assert_eq!(parse_literal("{3, 1, 3}").unwrap(), seq(vec![3.into(), 1.into()]));
        assert!(matches!(parse_literal("{[1]}"), Err(LiteralError::Unhashable(_))));
    }

    #[test]
    fn test_dicts() {
        let value = parse_literal("{'a': 1, 'b': [True, None], 'a': 2,}").unwrap();
        let map = value.as_mapping().unwrap();
        let keys: Vec<&str> = map.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(map["a"], OptionValue::Int(2));
        assert_eq!(parse_literal("{}").unwrap(), OptionValue::Mapping(OptionMap::new()));
        assert!(matches!(parse_literal("{1: 'x'}"), Err(LiteralError::UnsupportedKey(_))));
    }

    #[test]
    fn test_nested_and_whitespace() {
        let value = parse_literal("[\n  (1, 2),\n  {'k': -0.5},  # note\n]").unwrap();
        assert_eq!(value.to_string(), "[[1, 2], {'k': -0.5}]");
    }

    #[test]
    fn test_trailing_input_rejected() {
        assert!(matches!(parse_literal("1 2"), Err(LiteralError::UnexpectedToken { .. })));
        assert!(matches!(parse_literal("[1] ]"), Err(LiteralError::UnexpectedToken { .. })));
    }

    #[test]
    fn test_deep_nesting_falls_back_to_string() {
        let text = format!("{}1{}", "[".repeat(10_000), "]".repeat(10_000));
        assert_eq!(coerce(&text), (OptionValue::String(text.clone()), false));

        let unclosed = "[".repeat(10_000);
        assert_eq!(coerce(&unclosed), (OptionValue::String(unclosed.clone()), false));

        let signs = format!("{}1", "-".repeat(10_000));
        assert!(!coerce(&signs).1);
    }

    #[test]
    fn test_nesting_limit() {
        let ok = format!("{}1{}", "[".repeat(MAX_DEPTH - 1), "]".repeat(MAX_DEPTH - 1));
        assert!(parse_literal(&ok).is_ok());

        let deep = format!("{}1{}", "(".repeat(MAX_DEPTH), ")".repeat(MAX_DEPTH));
        assert_eq!(parse_literal(&deep), Err(LiteralError::TooDeep(MAX_DEPTH)));
    }

    #[test]
    fn test_non_finite_float_stays_text() {
        assert!(matches!(parse_literal("1e999"), Err(LiteralError::InvalidNumber(_))));
        assert_eq!(coerce("-1e999"), (OptionValue::from("-1e999"), false));
        assert_eq!(coerce("1e308"), (OptionValue::Float(1e308), true));
    }
}
