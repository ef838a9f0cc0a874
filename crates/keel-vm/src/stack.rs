//! Word stack of a single frame

use keel_primitives::Word;

use crate::error::TrapKind;

/// Maximum number of items on the stack
pub const MAX_STACK_SIZE: usize = 1024;

/// LIFO of 256-bit words, at most 1024 deep
#[derive(Clone, Debug)]
pub struct Stack {
    data: Vec<Word>,
}

impl Stack {
    /// Create a new empty stack
    pub fn new() -> Self {
        Self {
            data: Vec::with_capacity(32),
        }
    }

    /// Push a value onto the stack
    pub fn push(&mut self, value: Word) -> Result<(), TrapKind> {
        if self.data.len() >= MAX_STACK_SIZE {
            return Err(TrapKind::OutOfStack);
        }
        self.data.push(value);
        Ok(())
    }

    /// Push 0 or 1
    pub fn push_bool(&mut self, value: bool) -> Result<(), TrapKind> {
        self.push(if value { Word::one() } else { Word::zero() })
    }

    /// Pop the top value
    pub fn pop(&mut self) -> Result<Word, TrapKind> {
        self.data.pop().ok_or(TrapKind::StackUnderflow)
    }

    /// Pop `N` values, top first
    pub fn pop_n<const N: usize>(&mut self) -> Result<[Word; N], TrapKind> {
        if self.data.len() < N {
            return Err(TrapKind::StackUnderflow);
        }
        let mut out = [Word::zero(); N];
        for slot in out.iter_mut() {
            *slot = self.pop()?;
        }
        Ok(out)
    }

    /// Value at `depth` below the top (0 = top)
    pub fn peek(&self, depth: usize) -> Result<&Word, TrapKind> {
        if depth >= self.data.len() {
            return Err(TrapKind::StackUnderflow);
        }
        Ok(&self.data[self.data.len() - 1 - depth])
    }

    /// Swap the top with the item `depth` below it (1 = second item)
    pub fn swap(&mut self, depth: usize) -> Result<(), TrapKind> {
        if depth == 0 || depth >= self.data.len() {
            return Err(TrapKind::StackUnderflow);
        }
        let len = self.data.len();
        self.data.swap(len - 1, len - 1 - depth);
        Ok(())
    }

    /// Duplicate the item at `depth` onto the top (1 = top)
    pub fn dup(&mut self, depth: usize) -> Result<(), TrapKind> {
        if depth == 0 || depth > self.data.len() {
            return Err(TrapKind::StackUnderflow);
        }
        let value = self.data[self.data.len() - depth];
        self.push(value)
    }

    /// Current number of items
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the stack is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Items bottom first
    pub fn as_slice(&self) -> &[Word] {
        &self.data
    }
}

impl Default for Stack {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn w(v: u64) -> Word {
        Word::from(v)
    }

    #[test]
    fn test_stack_push_pop() {
        let mut stack = Stack::new();
        stack.push(w(1)).unwrap();
        stack.push(w(2)).unwrap();
        assert_eq!(stack.len(), 2);
        assert_eq!(stack.pop().unwrap(), w(2));
        assert_eq!(stack.pop().unwrap(), w(1));
        assert!(stack.is_empty());
    }

    #[test]
    fn test_stack_underflow() {
        let mut stack = Stack::new();
        assert_eq!(stack.pop(), Err(TrapKind::StackUnderflow));
        assert_eq!(stack.peek(0), Err(TrapKind::StackUnderflow));
    }

    #[test]
    fn test_stack_overflow() {
        let mut stack = Stack::new();
        for i in 0..MAX_STACK_SIZE {
            stack.push(w(i as u64)).unwrap();
        }
        assert_eq!(stack.push(w(0)), Err(TrapKind::OutOfStack));
        assert_eq!(stack.dup(1), Err(TrapKind::OutOfStack));
        assert_eq!(stack.len(), MAX_STACK_SIZE);
    }

    #[test]
    fn test_pop_n_order() {
        let mut stack = Stack::new();
        for v in 1..=3 {
            stack.push(w(v)).unwrap();
        }
        let [a, b] = stack.pop_n::<2>().unwrap();
        assert_eq!((a, b), (w(3), w(2)));
        assert_eq!(stack.pop_n::<2>(), Err(TrapKind::StackUnderflow));
        // a failed multi-pop leaves the stack untouched
        assert_eq!(stack.len(), 1);
    }

    #[test]
    fn test_stack_dup() {
        let mut stack = Stack::new();
        stack.push(w(1)).unwrap();
        stack.push(w(2)).unwrap();
        stack.dup(2).unwrap();
        assert_eq!(stack.as_slice(), &[w(1), w(2), w(1)]);
        assert_eq!(stack.dup(4), Err(TrapKind::StackUnderflow));
        assert_eq!(stack.dup(0), Err(TrapKind::StackUnderflow));
    }

    #[test]
    fn test_stack_swap() {
        let mut stack = Stack::new();
        for v in 1..=3 {
            stack.push(w(v)).unwrap();
        }
        stack.swap(2).unwrap();
        assert_eq!(stack.as_slice(), &[w(3), w(2), w(1)]);
        assert_eq!(stack.swap(3), Err(TrapKind::StackUnderflow));
        assert_eq!(stack.swap(0), Err(TrapKind::StackUnderflow));
    }

    #[test]
    fn test_stack_peek() {
        let mut stack = Stack::new();
        stack.push(w(10)).unwrap();
        stack.push(w(20)).unwrap();
        assert_eq!(*stack.peek(0).unwrap(), w(20));
        assert_eq!(*stack.peek(1).unwrap(), w(10));
        assert!(stack.peek(2).is_err());
    }

    #[test]
    fn test_push_bool() {
        let mut stack = Stack::default();
        stack.push_bool(true).unwrap();
        stack.push_bool(false).unwrap();
        assert_eq!(stack.as_slice(), &[Word::one(), Word::zero()]);
    }
}
