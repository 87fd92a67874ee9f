use crate::{Chord, Result};

#[derive(Debug)]
/// Create a testnet of Chord nodes on localhost, joined in one ring through the first node.
pub struct Testnet {
    pub nodes: Vec<Chord>,
}

impl Testnet {
    /// `count` UDP nodes with 64 bit ids.
    pub fn new(count: usize) -> Result<Testnet> {
        Testnet::with_bits(count, 64)
    }

    /// `count` UDP nodes in an identifier space of `bits` bits.
    ///
    /// Nodes may collide in small spaces, as ids are derived from ephemeral ports.
    pub fn with_bits(count: usize, bits: u8) -> Result<Testnet> {
        let mut nodes: Vec<Chord> = Vec::with_capacity(count);

        for _ in 0..count {
            let node = Chord::builder().id_bits(bits).build()?;

            let seed = nodes.first().map(|seed| seed.local().clone());
            node.join(seed.as_ref())?;

            nodes.push(node);
        }

        Ok(Testnet { nodes })
    }

    /// Stop every node.
    pub fn shutdown(&self) {
        for node in &self.nodes {
            node.shutdown();
        }
    }
}

impl Drop for Testnet {
    fn drop(&mut self) {
        self.shutdown();
    }
}
