use nalgebra::DVector;

/// Right-hand-side expression of a differential equation.
///
/// Expressions reference parameters and state variables by index into the
/// compiled model's `parameter_names` and `state_variables` tables, so a
/// single expression tree can be evaluated against any parameter vector
/// without name lookups.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Constant(f64),
    Parameter(usize),
    State(usize),
    Time,
    Add(Vec<Expr>),
    Mul(Vec<Expr>),
    Pow(Box<Expr>, Box<Expr>),
    /// `if lhs <= rhs { then } else { otherwise }`, used for the hockey-stick
    /// rate switch at the breakpoint time.
    IfLe {
        lhs: Box<Expr>,
        rhs: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
}

impl Expr {
    pub fn zero() -> Expr {
        Expr::Constant(0.0)
    }

    pub fn is_zero(&self) -> bool {
        matches!(self, Expr::Constant(c) if *c == 0.0)
    }

    pub fn neg(self) -> Expr {
        Expr::Mul(vec![Expr::Constant(-1.0), self])
    }

    /// `e^x`, expressed through the power node.
    pub fn exp(x: Expr) -> Expr {
        Expr::Pow(
            Box::new(Expr::Constant(std::f64::consts::E)),
            Box::new(x),
        )
    }

    /// Sum of `terms` with zero terms dropped.
    pub fn sum(terms: Vec<Expr>) -> Expr {
        let mut terms: Vec<Expr> = terms.into_iter().filter(|t| !t.is_zero()).collect();
        match terms.len() {
            0 => Expr::zero(),
            1 => terms.remove(0),
            _ => Expr::Add(terms),
        }
    }

    /// Product of `factors`; any zero factor collapses the product.
    pub fn product(factors: Vec<Expr>) -> Expr {
        if factors.iter().any(Expr::is_zero) {
            return Expr::zero();
        }
        let mut factors: Vec<Expr> = factors
            .into_iter()
            .filter(|f| !matches!(f, Expr::Constant(c) if *c == 1.0))
            .collect();
        match factors.len() {
            0 => Expr::Constant(1.0),
            1 => factors.remove(0),
            _ => Expr::Mul(factors),
        }
    }

    /// Tree-walking evaluation against time, state and parameters.
    pub fn eval(&self, t: f64, x: &DVector<f64>, p: &[f64]) -> f64 {
        match self {
            Expr::Constant(c) => *c,
            Expr::Parameter(i) => p[*i],
            Expr::State(i) => x[*i],
            Expr::Time => t,
            Expr::Add(terms) => terms.iter().map(|e| e.eval(t, x, p)).sum(),
            Expr::Mul(factors) => factors.iter().map(|e| e.eval(t, x, p)).product(),
            Expr::Pow(base, exp) => base.eval(t, x, p).powf(exp.eval(t, x, p)),
            Expr::IfLe {
                lhs,
                rhs,
                then,
                otherwise,
            } => {
                if lhs.eval(t, x, p) <= rhs.eval(t, x, p) {
                    then.eval(t, x, p)
                } else {
                    otherwise.eval(t, x, p)
                }
            }
        }
    }
}

/// One instruction of the lowered stack program.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Op {
    Const(f64),
    Param(u16),
    State(u16),
    Time,
    Add,
    Mul,
    Pow,
    /// Pops `otherwise`, `then`, `rhs`, `lhs`; pushes `then` if `lhs <= rhs`.
    SelectLe,
}

/// A differential-equation right-hand side lowered to a flat, array-indexed
/// instruction sequence evaluated on a value stack. This is the compiled
/// evaluation path; the expression tree stays around for display and for the
/// interpreted path.
#[derive(Debug, Clone)]
pub struct Program {
    ops: Vec<Op>,
    stack_depth: usize,
}

impl Program {
    pub fn compile(expr: &Expr) -> Program {
        let mut ops = Vec::new();
        emit(expr, &mut ops);
        let mut depth: usize = 0;
        let mut max_depth: usize = 0;
        for op in &ops {
            match op {
                Op::Const(_) | Op::Param(_) | Op::State(_) | Op::Time => depth += 1,
                Op::Add | Op::Mul | Op::Pow => depth -= 1,
                Op::SelectLe => depth -= 3,
            }
            max_depth = max_depth.max(depth);
        }
        Program {
            ops,
            stack_depth: max_depth,
        }
    }

    pub fn stack_depth(&self) -> usize {
        self.stack_depth
    }

    /// Runs the program. `stack` is caller-provided scratch space so that the
    /// ODE right-hand side does not allocate on every step.
    pub fn run(&self, t: f64, x: &DVector<f64>, p: &[f64], stack: &mut Vec<f64>) -> f64 {
        stack.clear();
        for op in &self.ops {
            match op {
                Op::Const(c) => stack.push(*c),
                Op::Param(i) => stack.push(p[*i as usize]),
                Op::State(i) => stack.push(x[*i as usize]),
                Op::Time => stack.push(t),
                Op::Add => {
                    let b = stack.pop().unwrap();
                    let a = stack.pop().unwrap();
                    stack.push(a + b);
                }
                Op::Mul => {
                    let b = stack.pop().unwrap();
                    let a = stack.pop().unwrap();
                    stack.push(a * b);
                }
                Op::Pow => {
                    let b = stack.pop().unwrap();
                    let a = stack.pop().unwrap();
                    stack.push(a.powf(b));
                }
                Op::SelectLe => {
                    let otherwise = stack.pop().unwrap();
                    let then = stack.pop().unwrap();
                    let rhs = stack.pop().unwrap();
                    let lhs = stack.pop().unwrap();
                    stack.push(if lhs <= rhs { then } else { otherwise });
                }
            }
        }
        stack.pop().unwrap()
    }
}

fn emit(expr: &Expr, ops: &mut Vec<Op>) {
    match expr {
        Expr::Constant(c) => ops.push(Op::Const(*c)),
        Expr::Parameter(i) => ops.push(Op::Param(*i as u16)),
        Expr::State(i) => ops.push(Op::State(*i as u16)),
        Expr::Time => ops.push(Op::Time),
        Expr::Add(terms) => {
            for (i, term) in terms.iter().enumerate() {
                emit(term, ops);
                if i > 0 {
                    ops.push(Op::Add);
                }
            }
            if terms.is_empty() {
                ops.push(Op::Const(0.0));
            }
        }
        Expr::Mul(factors) => {
            for (i, factor) in factors.iter().enumerate() {
                emit(factor, ops);
                if i > 0 {
                    ops.push(Op::Mul);
                }
            }
            if factors.is_empty() {
                ops.push(Op::Const(1.0));
            }
        }
        Expr::Pow(base, exp) => {
            emit(base, ops);
            emit(exp, ops);
            ops.push(Op::Pow);
        }
        Expr::IfLe {
            lhs,
            rhs,
            then,
            otherwise,
        } => {
            emit(lhs, ops);
            emit(rhs, ops);
            emit(then, ops);
            emit(otherwise, ops);
            ops.push(Op::SelectLe);
        }
    }
}

/// How a compiled model evaluates its derivatives. Selected once at build
/// time and stored on the model; never re-decided per call.
#[derive(Debug, Clone)]
pub enum EvaluationStrategy {
    /// Lowered stack programs, one per state variable.
    Compiled(Vec<Program>),
    /// Direct tree-walking evaluation of the expression ASTs.
    Interpreted,
}
