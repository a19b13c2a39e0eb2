// geodata_server/server/src/world/geodata/null.rs

/// Stand-in for cells without loaded geodata. Never blocks anything and
/// reports the queried height back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NullBlock {
    nswe: u8,
}

impl NullBlock {
    pub fn new(nswe: u8) -> Self {
        NullBlock { nswe }
    }

    pub fn nswe(&self) -> u8 {
        self.nswe
    }
}
