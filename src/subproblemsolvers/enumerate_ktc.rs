use crate::graph::KtcGraph;
use std::collections::BTreeMap;

/// Solves k-terminal cut by trying every assignment of the non-terminal vertices, only usable on
/// very small graphs
pub fn enumerate_solve(graph: &KtcGraph, terminals: &[usize]) -> (f64, BTreeMap<usize, usize>) {
    let free = graph
        .vertices()
        .filter(|v| !terminals.contains(v))
        .collect::<Vec<usize>>();
    let k = terminals.len();

    let mut assignment = terminals
        .iter()
        .map(|&t| (t, t))
        .collect::<BTreeMap<usize, usize>>();
    for &v in &free {
        assignment.insert(v, terminals[0]);
    }

    let mut best_obj = graph.cut_value(&assignment);
    let mut best_solution = assignment.clone();

    // mixed radix counter over the terminal index of each free vertex
    let mut digits = vec![0usize; free.len()];
    loop {
        let Some(position) = digits.iter().position(|&d| d + 1 < k) else {
            break;
        };
        for d in &mut digits[..position] {
            *d = 0;
        }
        digits[position] += 1;

        for (&v, &d) in free.iter().zip(&digits) {
            assignment.insert(v, terminals[d]);
        }

        let obj = graph.cut_value(&assignment);
        if obj < best_obj {
            best_obj = obj;
            best_solution.clone_from(&assignment);
        }
    }

    (best_obj, best_solution)
}

#[cfg(test)]
mod tests {
    use crate::subproblemsolvers::enumerate_ktc::enumerate_solve;
    use crate::tests::{make_cycle_graph, make_triangle_graph};

    #[test]
    fn enumerate_fixtures() {
        let (obj, solution) = enumerate_solve(&make_cycle_graph(), &[1, 2, 3, 4]);
        assert_eq!(obj, 8.0);
        assert_eq!(solution.len(), 8);

        let (obj, _) = enumerate_solve(&make_triangle_graph(), &[1, 2, 3]);
        assert_eq!(obj, 8.0);
    }
}
