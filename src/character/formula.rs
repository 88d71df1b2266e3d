/// Arithmetic formula language for derived resource pools.
///
/// Expressions are written infix in the configuration (`10 + level * 2.5`),
/// compiled once into reverse-polish form and evaluated on a value stack
/// against a named-variable snapshot.
///
/// **Supported Syntax:**
/// - Numbers: `12`, `2.5`
/// - Variables: any identifier (`level`, `base_str`, `display_agi`)
/// - Operators: `+ - * / %`, `^` (power, right associative), unary `-`
/// - Comparisons: `< > <= >= == !=` (yield 1 or 0)
/// - Functions: `min(a, b)`, `max(a, b)`, `floor(x)`, `ceil(x)`,
///   `round(x)`, `abs(x)`, `sqrt(x)`
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use log::warn;
use thiserror::Error;

/// Named-variable snapshot handed to the evaluator.
pub type FormulaVars = BTreeMap<String, f64>;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum FormulaError {
    #[error("unexpected character '{0}'")]
    UnexpectedChar(char),
    #[error("malformed number '{0}'")]
    BadNumber(String),
    #[error("unknown function '{0}'")]
    UnknownFunction(String),
    #[error("mismatched parentheses")]
    MismatchedParens,
    #[error("malformed expression")]
    Malformed,
    #[error("unknown variable '{0}'")]
    UnknownVariable(String),
    #[error("division by zero")]
    DivisionByZero,
}

/// Token types for lexical analysis
#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Identifier(String),
    Operator(BinaryOperator),
    Minus,
    LeftParen,
    RightParen,
    Comma,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    Equal,
    NotEqual,
}

impl BinaryOperator {
    fn precedence(self) -> u8 {
        match self {
            BinaryOperator::Less
            | BinaryOperator::Greater
            | BinaryOperator::LessEqual
            | BinaryOperator::GreaterEqual
            | BinaryOperator::Equal
            | BinaryOperator::NotEqual => 1,
            BinaryOperator::Add | BinaryOperator::Sub => 2,
            BinaryOperator::Mul | BinaryOperator::Div | BinaryOperator::Mod => 3,
            BinaryOperator::Pow => 5,
        }
    }

    fn right_associative(self) -> bool {
        self == BinaryOperator::Pow
    }

    fn apply(self, left: f64, right: f64) -> Result<f64, FormulaError> {
        let truth = |b: bool| if b { 1.0 } else { 0.0 };
        Ok(match self {
            BinaryOperator::Add => left + right,
            BinaryOperator::Sub => left - right,
            BinaryOperator::Mul => left * right,
            BinaryOperator::Div => {
                if right == 0.0 {
                    return Err(FormulaError::DivisionByZero);
                }
                left / right
            }
            BinaryOperator::Mod => {
                if right == 0.0 {
                    return Err(FormulaError::DivisionByZero);
                }
                left % right
            }
            BinaryOperator::Pow => left.powf(right),
            BinaryOperator::Less => truth(left < right),
            BinaryOperator::Greater => truth(left > right),
            BinaryOperator::LessEqual => truth(left <= right),
            BinaryOperator::GreaterEqual => truth(left >= right),
            BinaryOperator::Equal => truth(left == right),
            BinaryOperator::NotEqual => truth(left != right),
        })
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Sub => "-",
            BinaryOperator::Mul => "*",
            BinaryOperator::Div => "/",
            BinaryOperator::Mod => "%",
            BinaryOperator::Pow => "^",
            BinaryOperator::Less => "<",
            BinaryOperator::Greater => ">",
            BinaryOperator::LessEqual => "<=",
            BinaryOperator::GreaterEqual => ">=",
            BinaryOperator::Equal => "==",
            BinaryOperator::NotEqual => "!=",
        };
        f.write_str(symbol)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    Min,
    Max,
    Floor,
    Ceil,
    Round,
    Abs,
    Sqrt,
}

impl Function {
    fn lookup(name: &str) -> Option<Self> {
        Some(match name {
            "min" => Function::Min,
            "max" => Function::Max,
            "floor" => Function::Floor,
            "ceil" => Function::Ceil,
            "round" => Function::Round,
            "abs" => Function::Abs,
            "sqrt" => Function::Sqrt,
            _ => return None,
        })
    }

    fn arity(self) -> usize {
        match self {
            Function::Min | Function::Max => 2,
            _ => 1,
        }
    }
}

/// One step of a compiled program.
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    Push(f64),
    Load(String),
    Negate,
    Binary(BinaryOperator),
    Call(Function),
}

struct Tokenizer {
    input: Vec<char>,
    position: usize,
}

impl Tokenizer {
    fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
        }
    }

    fn current(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).copied()
    }

    fn read_while(&mut self, accept: impl Fn(char) -> bool) -> String {
        let mut result = String::new();
        while let Some(ch) = self.current() {
            if !accept(ch) {
                break;
            }
            result.push(ch);
            self.position += 1;
        }
        result
    }

    fn two_char(&mut self, second: char, double: BinaryOperator, single: Option<BinaryOperator>, ch: char) -> Result<Token, FormulaError> {
        if self.peek(1) == Some(second) {
            self.position += 2;
            return Ok(Token::Operator(double));
        }
        self.position += 1;
        single.map(Token::Operator).ok_or(FormulaError::UnexpectedChar(ch))
    }

    fn tokenize(mut self) -> Result<Vec<Token>, FormulaError> {
        let mut tokens = Vec::new();
        while let Some(ch) = self.current() {
            if ch.is_whitespace() {
                self.position += 1;
                continue;
            }
            let token = match ch {
                '0'..='9' | '.' => {
                    let text = self.read_while(|c| c.is_ascii_digit() || c == '.');
                    let value = text.parse::<f64>().map_err(|_| FormulaError::BadNumber(text))?;
                    Token::Number(value)
                }
                c if c.is_alphabetic() || c == '_' => {
                    Token::Identifier(self.read_while(|c| c.is_alphanumeric() || c == '_' || c == '.'))
                }
                '+' | '*' | '/' | '%' | '^' => {
                    self.position += 1;
                    Token::Operator(match ch {
                        '+' => BinaryOperator::Add,
                        '*' => BinaryOperator::Mul,
                        '/' => BinaryOperator::Div,
                        '%' => BinaryOperator::Mod,
                        _ => BinaryOperator::Pow,
                    })
                }
                '-' => {
                    self.position += 1;
                    Token::Minus
                }
                '<' => self.two_char('=', BinaryOperator::LessEqual, Some(BinaryOperator::Less), ch)?,
                '>' => self.two_char('=', BinaryOperator::GreaterEqual, Some(BinaryOperator::Greater), ch)?,
                '=' => self.two_char('=', BinaryOperator::Equal, None, ch)?,
                '!' => self.two_char('=', BinaryOperator::NotEqual, None, ch)?,
                '(' => {
                    self.position += 1;
                    Token::LeftParen
                }
                ')' => {
                    self.position += 1;
                    Token::RightParen
                }
                ',' => {
                    self.position += 1;
                    Token::Comma
                }
                other => return Err(FormulaError::UnexpectedChar(other)),
            };
            tokens.push(token);
        }
        Ok(tokens)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum StackEntry {
    Operator(BinaryOperator),
    Negate,
    Function(Function),
    Paren,
}

/// A compiled formula. An empty expression evaluates to 0.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Formula {
    program: Vec<Instruction>,
}

impl Formula {
    /// Compile infix `text` into reverse-polish form (shunting-yard).
    pub fn parse(text: &str) -> Result<Self, FormulaError> {
        let tokens = Tokenizer::new(text).tokenize()?;
        let mut output: Vec<Instruction> = Vec::new();
        let mut stack: Vec<StackEntry> = Vec::new();
        // true when the next token starts an operand (so '-' is unary)
        let mut expect_operand = true;

        let mut iter = tokens.into_iter().peekable();
        while let Some(token) = iter.next() {
            match token {
                Token::Number(value) => {
                    output.push(Instruction::Push(value));
                    expect_operand = false;
                }
                Token::Identifier(name) => {
                    if iter.peek() == Some(&Token::LeftParen) {
                        let function = Function::lookup(&name)
                            .ok_or_else(|| FormulaError::UnknownFunction(name.clone()))?;
                        stack.push(StackEntry::Function(function));
                        expect_operand = true;
                    } else {
                        output.push(Instruction::Load(name));
                        expect_operand = false;
                    }
                }
                Token::Minus if expect_operand => stack.push(StackEntry::Negate),
                Token::Minus | Token::Operator(_) => {
                    if expect_operand {
                        return Err(FormulaError::Malformed);
                    }
                    let op = match token {
                        Token::Operator(op) => op,
                        _ => BinaryOperator::Sub,
                    };
                    while let Some(top) = stack.last() {
                        let pops = match top {
                            StackEntry::Negate => op.precedence() < 4,
                            StackEntry::Operator(prev) => {
                                prev.precedence() > op.precedence()
                                    || (prev.precedence() == op.precedence() && !op.right_associative())
                            }
                            _ => false,
                        };
                        if !pops {
                            break;
                        }
                        Self::emit(stack.pop(), &mut output)?;
                    }
                    stack.push(StackEntry::Operator(op));
                    expect_operand = true;
                }
                Token::LeftParen => {
                    stack.push(StackEntry::Paren);
                    expect_operand = true;
                }
                Token::Comma => {
                    while stack.last().is_some_and(|top| *top != StackEntry::Paren) {
                        Self::emit(stack.pop(), &mut output)?;
                    }
                    if stack.is_empty() {
                        return Err(FormulaError::MismatchedParens);
                    }
                    expect_operand = true;
                }
                Token::RightParen => {
                    loop {
                        match stack.pop() {
                            Some(StackEntry::Paren) => break,
                            Some(entry) => Self::emit(Some(entry), &mut output)?,
                            None => return Err(FormulaError::MismatchedParens),
                        }
                    }
                    if let Some(StackEntry::Function(_)) = stack.last() {
                        Self::emit(stack.pop(), &mut output)?;
                    }
                    expect_operand = false;
                }
            }
        }

        while let Some(entry) = stack.pop() {
            if entry == StackEntry::Paren {
                return Err(FormulaError::MismatchedParens);
            }
            Self::emit(Some(entry), &mut output)?;
        }

        let formula = Self { program: output };
        formula.check_arity()?;
        Ok(formula)
    }

    fn emit(entry: Option<StackEntry>, output: &mut Vec<Instruction>) -> Result<(), FormulaError> {
        match entry {
            Some(StackEntry::Operator(op)) => output.push(Instruction::Binary(op)),
            Some(StackEntry::Negate) => output.push(Instruction::Negate),
            Some(StackEntry::Function(function)) => output.push(Instruction::Call(function)),
            Some(StackEntry::Paren) => return Err(FormulaError::MismatchedParens),
            None => return Err(FormulaError::Malformed),
        }
        Ok(())
    }

    /// Reject programs that would underflow or leave extra values behind.
    fn check_arity(&self) -> Result<(), FormulaError> {
        let mut depth: usize = 0;
        for instruction in &self.program {
            let (pops, pushes) = match instruction {
                Instruction::Push(_) | Instruction::Load(_) => (0, 1),
                Instruction::Negate => (1, 1),
                Instruction::Binary(_) => (2, 1),
                Instruction::Call(function) => (function.arity(), 1),
            };
            depth = depth.checked_sub(pops).ok_or(FormulaError::Malformed)? + pushes;
        }
        if self.program.is_empty() || depth == 1 {
            Ok(())
        } else {
            Err(FormulaError::Malformed)
        }
    }

    pub fn program(&self) -> &[Instruction] {
        &self.program
    }

    /// Evaluate against `vars`. Every referenced variable must be present.
    pub fn eval(&self, vars: &FormulaVars) -> Result<f64, FormulaError> {
        let mut stack: Vec<f64> = Vec::with_capacity(8);
        let pop = |stack: &mut Vec<f64>| stack.pop().ok_or(FormulaError::Malformed);

        for instruction in &self.program {
            let value = match instruction {
                Instruction::Push(value) => *value,
                Instruction::Load(name) => *vars
                    .get(name)
                    .ok_or_else(|| FormulaError::UnknownVariable(name.clone()))?,
                Instruction::Negate => -pop(&mut stack)?,
                Instruction::Binary(op) => {
                    let right = pop(&mut stack)?;
                    let left = pop(&mut stack)?;
                    op.apply(left, right)?
                }
                Instruction::Call(function) => {
                    let arg = pop(&mut stack)?;
                    match function {
                        Function::Min => pop(&mut stack)?.min(arg),
                        Function::Max => pop(&mut stack)?.max(arg),
                        Function::Floor => arg.floor(),
                        Function::Ceil => arg.ceil(),
                        Function::Round => arg.round(),
                        Function::Abs => arg.abs(),
                        Function::Sqrt => arg.sqrt(),
                    }
                }
            };
            stack.push(value);
        }

        Ok(stack.pop().unwrap_or(0.0))
    }
}

/// Compiled formulas keyed by configuration name (`hp`, `class.1.damage`…).
#[derive(Debug, Clone, Default)]
pub struct FormulaSet {
    formulas: HashMap<String, Formula>,
}

impl FormulaSet {
    /// Compile every entry; the first failure is returned with its key.
    pub fn compile<'a>(
        sources: impl IntoIterator<Item = (&'a String, &'a String)>,
    ) -> Result<Self, (String, FormulaError)> {
        let mut formulas = HashMap::new();
        for (key, text) in sources {
            let formula = Formula::parse(text).map_err(|err| (key.clone(), err))?;
            formulas.insert(key.clone(), formula);
        }
        Ok(Self { formulas })
    }

    pub fn get(&self, key: &str) -> Option<&Formula> {
        self.formulas.get(key)
    }

    /// Evaluate `key`, treating a missing formula as 0 and logging any
    /// evaluation fault as 0.
    pub fn eval_or_zero(&self, key: &str, vars: &FormulaVars) -> f64 {
        let Some(formula) = self.formulas.get(key) else {
            return 0.0;
        };
        match formula.eval(vars) {
            Ok(value) if value.is_finite() => value,
            Ok(value) => {
                warn!("formula `{}` produced non-finite value {}", key, value);
                0.0
            }
            Err(err) => {
                warn!("formula `{}` failed: {}", key, err);
                0.0
            }
        }
    }

    pub fn len(&self) -> usize {
        self.formulas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.formulas.is_empty()
    }
}
