//! Function symbol collection from the kernel image's `.symtab`

use object::{Object, ObjectSection, ObjectSymbol, SectionIndex, SymbolKind};

/// A defined function symbol
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSymbol {
    pub name: String,
    pub address: u64,
    pub size: u64,
    /// `nm`-style type letter: `T` global, `W` weak, `t` local
    pub symbol_type: char,
    pub section: Option<SectionIndex>,
}

impl FunctionSymbol {
    #[must_use]
    pub fn end(&self) -> u64 {
        self.address.saturating_add(self.size)
    }
}

/// Collect every defined, sized text symbol, sorted by address then name
#[must_use]
pub fn collect_functions(obj: &object::File<'_>) -> Vec<FunctionSymbol> {
    let mut functions: Vec<FunctionSymbol> = obj
        .symbols()
        .filter(|s| s.kind() == SymbolKind::Text && s.is_definition() && s.size() > 0)
        .filter_map(|s| {
            let name = s.name().ok()?;
            if name.is_empty() {
                return None;
            }
            Some(FunctionSymbol {
                name: name.to_string(),
                address: s.address(),
                size: s.size(),
                symbol_type: symbol_type(&s),
                section: s.section_index(),
            })
        })
        .collect();

    functions.sort_by(|a, b| a.address.cmp(&b.address).then_with(|| a.name.cmp(&b.name)));
    functions
}

/// Raw bytes of a function, if its section holds file data
#[must_use]
pub fn function_bytes<'data>(
    obj: &object::File<'data>,
    function: &FunctionSymbol,
) -> Option<&'data [u8]> {
    let section = obj.section_by_index(function.section?).ok()?;
    section.data_range(function.address, function.size).ok()?
}

fn symbol_type<'data, S: ObjectSymbol<'data>>(symbol: &S) -> char {
    if symbol.is_weak() {
        'W'
    } else if symbol.is_global() {
        'T'
    } else {
        't'
    }
}
