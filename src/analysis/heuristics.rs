//! Name lists behind the memory and I/O heuristics

use serde::{Deserialize, Serialize};

/// Function names treated as allocation, deallocation and I/O
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Heuristics {
    pub allocators: Vec<String>,
    pub deallocators: Vec<String>,
    pub io_functions: Vec<String>,
}

impl Default for Heuristics {
    fn default() -> Self {
        Self {
            allocators: to_strings(&["malloc", "calloc", "realloc"]),
            deallocators: to_strings(&["free"]),
            io_functions: to_strings(&[
                "printf", "fprintf", "puts", "putchar", "write", "send", "read", "recv", "fwrite",
                "fread", "fopen", "fclose", "scanf",
            ]),
        }
    }
}

impl Heuristics {
    pub fn is_allocator(&self, name: &str) -> bool {
        self.allocators.iter().any(|a| a == name)
    }

    pub fn is_deallocator(&self, name: &str) -> bool {
        self.deallocators.iter().any(|d| d == name)
    }

    pub fn is_io(&self, name: &str) -> bool {
        self.io_functions.iter().any(|f| f == name)
    }
}

fn to_strings(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}
