use calc_ast::{Constant, Context, Expr, ExprId};
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::multispace0,
    combinator::map,
    multi::{fold_many0, separated_list0},
    sequence::{delimited, pair, preceded},
    IResult,
};
use num_bigint::BigInt;
use num_rational::BigRational;

use crate::error::ParseError;

// Intermediate AST; lowered into the arena once parsing succeeds.
#[derive(Debug, Clone)]
enum ParseNode {
    Number(BigRational),
    Constant(Constant),
    Variable(String),
    Add(Box<ParseNode>, Box<ParseNode>),
    Sub(Box<ParseNode>, Box<ParseNode>),
    Mul(Box<ParseNode>, Box<ParseNode>),
    Div(Box<ParseNode>, Box<ParseNode>),
    Pow(Box<ParseNode>, Box<ParseNode>),
    Neg(Box<ParseNode>),
    Function(String, Vec<ParseNode>),
}

impl ParseNode {
    fn lower(self, ctx: &mut Context) -> ExprId {
        match self {
            ParseNode::Number(n) => ctx.add(Expr::Number(n)),
            ParseNode::Constant(c) => ctx.add(Expr::Constant(c)),
            ParseNode::Variable(s) => ctx.add(Expr::Variable(s)),
            ParseNode::Add(l, r) => {
                let lid = l.lower(ctx);
                let rid = r.lower(ctx);
                ctx.add(Expr::Add(lid, rid))
            }
            ParseNode::Sub(l, r) => {
                let lid = l.lower(ctx);
                let rid = r.lower(ctx);
                ctx.add(Expr::Sub(lid, rid))
            }
            ParseNode::Mul(l, r) => {
                let lid = l.lower(ctx);
                let rid = r.lower(ctx);
                ctx.add(Expr::Mul(lid, rid))
            }
            ParseNode::Div(l, r) => {
                let lid = l.lower(ctx);
                let rid = r.lower(ctx);
                ctx.add(Expr::Div(lid, rid))
            }
            ParseNode::Pow(b, e) => {
                let bid = b.lower(ctx);
                let eid = e.lower(ctx);
                ctx.add(Expr::Pow(bid, eid))
            }
            ParseNode::Neg(e) => {
                let eid = e.lower(ctx);
                ctx.add(Expr::Neg(eid))
            }
            ParseNode::Function(name, args) => {
                let arg_ids = args.into_iter().map(|a| a.lower(ctx)).collect();
                ctx.add(Expr::Function(name, arg_ids))
            }
        }
    }
}

/// Convert a decimal string to an exact rational.
/// "8.2" → 41/5, ".5" → 1/2, "8." → 8, "123" → 123.
fn decimal_to_rational(integer_part: &str, fractional_part: &str) -> BigRational {
    let k = fractional_part.len();

    let int_val: BigInt = if integer_part.is_empty() {
        BigInt::from(0)
    } else {
        integer_part.parse().unwrap_or_else(|_| BigInt::from(0))
    };

    if k == 0 {
        return BigRational::from_integer(int_val);
    }

    let mut denominator = BigInt::from(1);
    for _ in 0..k {
        denominator *= 10;
    }
    let frac_val: BigInt = fractional_part.parse().unwrap_or_else(|_| BigInt::from(0));
    let numerator = int_val * &denominator + frac_val;

    // BigRational::new reduces by gcd automatically.
    BigRational::new(numerator, denominator)
}

// Numeric literals: 123, 8.2, .5, 8.
fn parse_number(input: &str) -> IResult<&str, ParseNode> {
    use nom::bytes::complete::take_while;
    use nom::combinator::opt;

    fn is_digit(c: char) -> bool {
        c.is_ascii_digit()
    }

    let (remaining, (int_part, maybe_frac)) = pair(
        take_while(is_digit),
        opt(pair(tag("."), take_while(is_digit))),
    )(input)?;

    let (int_str, frac_str) = match maybe_frac {
        Some((_, frac)) => (int_part, frac),
        None => (int_part, ""),
    };

    if int_str.is_empty() && frac_str.is_empty() {
        return Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Digit,
        )));
    }

    let rational = decimal_to_rational(int_str, frac_str);
    Ok((remaining, ParseNode::Number(rational)))
}

// Constants with word-boundary checks so that 'e' and 'pi' do not swallow
// prefixes of longer identifiers ('exact', 'pivot'). Infinity accepts the
// spellings used in limit targets: oo, inf, infinity, ∞.
fn parse_constant(input: &str) -> IResult<&str, ParseNode> {
    fn is_word_boundary(remaining: &str) -> bool {
        remaining
            .chars()
            .next()
            .map_or(true, |c| !c.is_ascii_alphanumeric() && c != '_')
    }

    if let Some(rest) = input.strip_prefix('∞') {
        return Ok((rest, ParseNode::Constant(Constant::Infinity)));
    }
    for word in ["infinity", "inf", "oo"] {
        if let Some(rest) = input.strip_prefix(word) {
            if is_word_boundary(rest) {
                return Ok((rest, ParseNode::Constant(Constant::Infinity)));
            }
        }
    }
    if let Some(rest) = input.strip_prefix("pi") {
        if is_word_boundary(rest) {
            return Ok((rest, ParseNode::Constant(Constant::Pi)));
        }
    }
    if let Some(rest) = input.strip_prefix('e') {
        if is_word_boundary(rest) {
            return Ok((rest, ParseNode::Constant(Constant::E)));
        }
    }

    Err(nom::Err::Error(nom::error::Error::new(
        input,
        nom::error::ErrorKind::Tag,
    )))
}

// Identifiers: letter or underscore, then letters/digits/underscores.
fn parse_identifier(input: &str) -> IResult<&str, &str> {
    let mut chars = input.chars();
    let first = chars.next();
    if !matches!(first, Some(c) if c.is_ascii_alphabetic() || c == '_') {
        return Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Alpha,
        )));
    }

    let mut len = first.unwrap().len_utf8();
    for c in chars {
        if c.is_ascii_alphanumeric() || c == '_' {
            len += c.len_utf8();
        } else {
            break;
        }
    }

    Ok((&input[len..], &input[..len]))
}

fn parse_variable(input: &str) -> IResult<&str, ParseNode> {
    map(parse_identifier, |s: &str| {
        ParseNode::Variable(s.to_string())
    })(input)
}

fn parse_parens(input: &str) -> IResult<&str, ParseNode> {
    delimited(
        preceded(multispace0, tag("(")),
        parse_expr,
        preceded(multispace0, tag(")")),
    )(input)
}

fn parse_function(input: &str) -> IResult<&str, ParseNode> {
    let (input, name) = parse_identifier(input)?;
    let (input, _) = preceded(multispace0, tag("("))(input)?;
    let (input, args) = separated_list0(preceded(multispace0, tag(",")), parse_expr)(input)?;
    let (input, _) = preceded(multispace0, tag(")"))(input)?;

    Ok((input, ParseNode::Function(name.to_string(), args)))
}

fn parse_atom(input: &str) -> IResult<&str, ParseNode> {
    preceded(
        multispace0,
        alt((
            parse_number,
            parse_function,
            parse_constant,
            parse_variable,
            parse_parens,
        )),
    )(input)
}

// Power is right-associative: 2^3^4 = 2^(3^4). The exponent may carry a
// sign: x^-2, x^-(a+b). `**` is accepted as a synonym for `^`.
fn parse_power(input: &str) -> IResult<&str, ParseNode> {
    let (input, base) = parse_atom(input)?;

    let try_op = preceded(
        multispace0::<_, nom::error::Error<&str>>,
        alt((tag("**"), tag("^"))),
    )(input);

    if let Ok((input, _)) = try_op {
        let (input, exp) = parse_power_exponent(input)?;
        Ok((input, ParseNode::Pow(Box::new(base), Box::new(exp))))
    } else {
        Ok((input, base))
    }
}

fn parse_power_exponent(input: &str) -> IResult<&str, ParseNode> {
    preceded(
        multispace0,
        alt((
            map(pair(tag("-"), parse_power_exponent), |(_, expr)| {
                ParseNode::Neg(Box::new(expr))
            }),
            map(pair(tag("+"), parse_power_exponent), |(_, expr)| expr),
            parse_power,
        )),
    )(input)
}

fn parse_unary(input: &str) -> IResult<&str, ParseNode> {
    alt((
        map(
            pair(preceded(multispace0, tag("-")), parse_unary),
            |(_, expr)| ParseNode::Neg(Box::new(expr)),
        ),
        parse_power,
    ))(input)
}

// Terms: explicit * and /, then implicit multiplication (2x, 3(x+y), 2sin(x)).
fn parse_term(input: &str) -> IResult<&str, ParseNode> {
    let (input, init) = parse_unary(input)?;

    let (input, result) = fold_many0(
        pair(
            preceded(multispace0, alt((tag("*"), tag("/")))),
            parse_unary,
        ),
        move || init.clone(),
        |acc, (op, val)| match op {
            "*" => ParseNode::Mul(Box::new(acc), Box::new(val)),
            "/" => ParseNode::Div(Box::new(acc), Box::new(val)),
            _ => unreachable!(),
        },
    )(input)?;

    parse_implicit_mul_chain(input, result)
}

// Implicit multiplication chain: 2x → 2*x, 2xy → 2*x*y. Applied only when
// there is no whitespace between a number-like factor and the next token.
fn parse_implicit_mul_chain(input: &str, acc: ParseNode) -> IResult<&str, ParseNode> {
    let first_char = input.chars().next();

    match first_char {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '(' => {
            if can_implicit_mul(&acc) {
                if let Ok((remaining, next_factor)) = parse_unary(input) {
                    let new_acc = ParseNode::Mul(Box::new(acc), Box::new(next_factor));
                    return parse_implicit_mul_chain(remaining, new_acc);
                }
            }
            Ok((input, acc))
        }
        _ => Ok((input, acc)),
    }
}

// Implicit multiplication only follows factors that end in a number, so
// identifiers like x1 stay single variables.
fn can_implicit_mul(node: &ParseNode) -> bool {
    match node {
        ParseNode::Number(_) => true,
        ParseNode::Pow(_, _) => true,
        ParseNode::Mul(_, right) | ParseNode::Div(_, right) => can_implicit_mul(right),
        _ => false,
    }
}

fn parse_expr(input: &str) -> IResult<&str, ParseNode> {
    let (input, init) = parse_term(input)?;
    fold_many0(
        pair(preceded(multispace0, alt((tag("+"), tag("-")))), parse_term),
        move || init.clone(),
        |acc, (op, val)| match op {
            "+" => ParseNode::Add(Box::new(acc), Box::new(val)),
            "-" => ParseNode::Sub(Box::new(acc), Box::new(val)),
            _ => unreachable!(),
        },
    )(input)
}

/// Parse an expression in the engine's syntax into the arena.
pub fn parse(input: &str, ctx: &mut Context) -> Result<ExprId, ParseError> {
    let (remaining, expr_node) =
        parse_expr(input).map_err(|e| ParseError::NomError(format!("{}", e)))?;

    let remaining = remaining.trim();
    if !remaining.is_empty() {
        return Err(ParseError::UnconsumedInput(remaining.to_string()));
    }

    Ok(expr_node.lower(ctx))
}
