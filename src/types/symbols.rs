//! Symbols and scoped symbol tables used during semantic analysis

use std::collections::HashMap;
use std::fmt;

use super::Type;

/// Anything a name can be bound to at analysis time
#[derive(Debug, Clone, PartialEq)]
pub enum Symbol {
    /// A builtin type name (INTEGER, FLOAT)
    BuiltinType(BuiltinTypeSymbol),
    /// A declared variable
    Var(VarSymbol),
}

impl Symbol {
    /// Bound name
    pub fn name(&self) -> &str {
        match self {
            Symbol::BuiltinType(symbol) => &symbol.name,
            Symbol::Var(symbol) => &symbol.name,
        }
    }

    /// Type the symbol denotes (builtin) or carries (variable)
    pub fn ty(&self) -> &Type {
        match self {
            Symbol::BuiltinType(symbol) => &symbol.ty,
            Symbol::Var(symbol) => &symbol.ty,
        }
    }

    fn set_scope_level(&mut self, level: usize) {
        match self {
            Symbol::BuiltinType(symbol) => symbol.scope_level = level,
            Symbol::Var(symbol) => symbol.scope_level = level,
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbol::BuiltinType(symbol) => write!(f, "{}", symbol.name),
            Symbol::Var(symbol) => {
                write!(f, "<VarSymbol(name={}, type={})>", symbol.name, symbol.ty)
            }
        }
    }
}

/// Builtin type name
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltinTypeSymbol {
    pub name: String,
    pub ty: Type,
    /// Level of the table the symbol was inserted into
    pub scope_level: usize,
}

impl BuiltinTypeSymbol {
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        BuiltinTypeSymbol {
            name: name.into(),
            ty,
            scope_level: 0,
        }
    }
}

/// Declared variable
#[derive(Debug, Clone, PartialEq)]
pub struct VarSymbol {
    pub name: String,
    pub ty: Type,
    /// Inclusive index bounds for array variables
    pub bounds: Option<(i64, i64)>,
    /// Level of the table the symbol was inserted into
    pub scope_level: usize,
}

impl VarSymbol {
    /// Creates a variable symbol; array bounds are taken from the type
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        let bounds = match &ty {
            Type::Array(array) => Some((array.start, array.end)),
            Type::Integer | Type::Float => None,
        };
        VarSymbol {
            name: name.into(),
            ty,
            bounds,
            scope_level: 0,
        }
    }
}

/// Symbols bound at one lexical level, linked to the enclosing level
#[derive(Debug)]
pub struct ScopedSymbolTable<'a> {
    name: String,
    level: usize,
    symbols: HashMap<String, Symbol>,
    /// Names in insertion order, for display
    order: Vec<String>,
    enclosing: Option<&'a ScopedSymbolTable<'a>>,
}

impl<'a> ScopedSymbolTable<'a> {
    /// Creates an empty table
    pub fn new(
        name: impl Into<String>,
        level: usize,
        enclosing: Option<&'a ScopedSymbolTable<'a>>,
    ) -> Self {
        ScopedSymbolTable {
            name: name.into(),
            level,
            symbols: HashMap::new(),
            order: Vec::new(),
            enclosing,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn level(&self) -> usize {
        self.level
    }

    pub fn enclosing(&self) -> Option<&'a ScopedSymbolTable<'a>> {
        self.enclosing
    }

    /// Binds a symbol at this level, stamping it with the table's level
    pub fn insert(&mut self, mut symbol: Symbol) {
        symbol.set_scope_level(self.level);
        let name = symbol.name().to_string();
        if !self.symbols.contains_key(&name) {
            self.order.push(name.clone());
        }
        self.symbols.insert(name, symbol);
    }

    /// Looks a name up here, then through every enclosing table
    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        match self.symbols.get(name) {
            Some(symbol) => Some(symbol),
            None => self.enclosing.and_then(|outer| outer.lookup(name)),
        }
    }

    /// Looks a name up at this level only
    pub fn lookup_current(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }

    /// Number of symbols bound at this level
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

impl fmt::Display for ScopedSymbolTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let title = "SCOPE (SCOPED SYMBOL TABLE)";
        writeln!(f, "{}", title)?;
        writeln!(f, "{}", "=".repeat(title.len()))?;
        writeln!(f, "{:<15}: {}", "Scope name", self.name)?;
        writeln!(f, "{:<15}: {}", "Scope level", self.level)?;
        writeln!(
            f,
            "{:<15}: {}",
            "Enclosing scope",
            self.enclosing.map(|outer| outer.name()).unwrap_or("None")
        )?;

        let contents = "Scope (Scoped symbol table) contents";
        writeln!(f, "{}", contents)?;
        write!(f, "{}", "-".repeat(contents.len()))?;
        for name in &self.order {
            if let Some(symbol) = self.symbols.get(name) {
                write!(f, "\n{:<7}: {}", name, symbol)?;
            }
        }
        Ok(())
    }
}
