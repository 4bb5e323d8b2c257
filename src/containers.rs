/// Vec with stable indices. Removing an item leaves a hole that the next
/// [`FixedVec::first_free_pos`] hands out again.
#[derive(Debug, Clone)]
pub struct FixedVec<T> {
    vec: Vec<Option<T>>,
    first_free: Option<usize>,
}

impl<T> Default for FixedVec<T> {
    fn default() -> Self {
        Self {
            vec: vec![],
            first_free: None,
        }
    }
}

impl<T> FixedVec<T> {
    pub fn get_clone(&self, pos: usize) -> Option<T>
    where
        T: Clone,
    {
        self.vec.get(pos)?.as_ref().cloned()
    }

    pub fn remove(&mut self, pos: usize) -> Option<T> {
        if pos >= self.vec.len() {
            return None;
        }

        let item = &mut self.vec[pos];

        if item.is_some() {
            match &mut self.first_free {
                Some(v) if *v < pos => {}
                fe => *fe = Some(pos),
            }
        }

        let value = item.take();

        if pos == self.vec.len() - 1 {
            self.vec.remove(pos);
            while !self.vec.is_empty() && self.vec[self.vec.len() - 1].is_none() {
                self.vec.remove(self.vec.len() - 1);
            }
            if self.first_free.is_some_and(|ff| ff >= self.vec.len()) {
                self.first_free = None;
            }
        }

        value
    }

    /// Stores `value` at `into`, returning what was there before.
    pub fn set(&mut self, value: T, into: usize) -> Option<T> {
        if into >= self.vec.len() {
            if self.vec.len() != into && self.first_free.is_none() {
                self.first_free = Some(self.vec.len())
            }
            self.vec.reserve(into + 1 - self.vec.len());
            while self.vec.len() <= into {
                self.vec.push(None)
            }
            self.vec[into] = Some(value);
            return None;
        };

        if let Some(ff) = self.first_free {
            if ff == into {
                self.first_free = (ff + 1..self.vec.len()).find(|i| self.vec[*i].is_none());
            }
        }

        self.vec[into].replace(value)
    }

    /// Stores `value` in the first hole, or at the end.
    pub fn push(&mut self, value: T) -> usize {
        let pos = self.first_free_pos();
        self.set(value, pos);
        pos
    }

    pub fn first_free_pos(&self) -> usize {
        match self.first_free {
            Some(v) => v,
            None => self.vec.len(),
        }
    }

    /// Number of slots, holes included.
    pub fn slots(&self) -> usize {
        self.vec.len()
    }

    pub fn len(&self) -> usize {
        self.vec.iter().filter(|v| v.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.vec.iter().all(|v| v.is_none())
    }

    pub fn clear(&mut self) {
        self.vec.clear();
        self.first_free = None;
    }

    pub fn iter(&self) -> FixedVecIterator<'_, T> {
        FixedVecIterator {
            vec: &self.vec,
            pos: 0,
        }
    }

    pub fn iter_indexed(&self) -> impl Iterator<Item = (usize, &T)> {
        self.vec
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.as_ref().map(|v| (i, v)))
    }
}

pub struct FixedVecIterator<'a, T> {
    vec: &'a Vec<Option<T>>,
    pos: usize,
}

impl<'a, T> Iterator for FixedVecIterator<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        while self.pos < self.vec.len() {
            self.pos += 1;
            if let Some(v) = &self.vec[self.pos - 1] {
                return Some(v);
            }
        }
        None
    }
}

#[cfg(test)]
mod test {
    use super::FixedVec;

    #[test]
    fn fixed_vec_remove_shrink() {
        let mut fv = FixedVec::default();

        fv.set(35, 0);
        fv.set(15, 1);
        assert_eq!(fv.set(100, 4), None);
        assert_eq!(fv.set(101, 4), Some(100));

        assert_eq!(fv.slots(), 5);
        fv.remove(4);
        assert_eq!(fv.slots(), 2);
        assert_eq!(fv.first_free_pos(), 2);
    }

    #[test]
    fn fixed_vec_reuses_holes() {
        let mut fv = FixedVec::default();
        assert_eq!(fv.push('a'), 0);
        assert_eq!(fv.push('b'), 1);
        assert_eq!(fv.push('c'), 2);

        fv.remove(1);
        assert_eq!(fv.len(), 2);
        assert_eq!(fv.push('d'), 1);
        assert_eq!(fv.push('e'), 3);

        let items: Vec<_> = fv.iter_indexed().map(|(i, c)| (i, *c)).collect();
        assert_eq!(items, vec![(0, 'a'), (1, 'd'), (2, 'c'), (3, 'e')]);
    }
}
