//! Complexity Analyzer (C7, spec §4.7): cheap lexical scoring over a
//! function's body text, used to gate control-flow analysis.

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ComplexityScore {
    pub cyclomatic: f32,
    pub cognitive: f32,
    pub nesting_depth: u32,
    pub parameter_count: u32,
    pub local_variable_count: u32,
    pub line_count: u32,
    pub readability: f32,
    pub testability: f32,
}

impl ComplexityScore {
    /// `max(0, floor(score))` per spec §4.7.
    pub fn gate_score(&self) -> u32 {
        self.cyclomatic.max(0.0).floor() as u32
    }
}

fn count_word(body: &str, word: &str) -> u32 {
    body.split(|c: char| !c.is_alphanumeric() && c != '_')
        .filter(|tok| *tok == word)
        .count() as u32
}

/// Count occurrences of `first` immediately followed by `second` in the
/// token stream (e.g. `else` `if`), ignoring empty tokens from splitting.
fn count_word_pair(body: &str, first: &str, second: &str) -> u32 {
    let tokens: Vec<&str> = body
        .split(|c: char| !c.is_alphanumeric() && c != '_')
        .filter(|tok| !tok.is_empty())
        .collect();
    tokens
        .windows(2)
        .filter(|pair| pair[0] == first && pair[1] == second)
        .count() as u32
}

/// Score a function given its body text, name, and declared parameter
/// count (spec §4.7).
pub fn analyze(name: &str, body: &str, parameter_count: u32, local_variable_count: u32) -> ComplexityScore {
    let line_count = body.lines().filter(|l| !l.trim().is_empty()).count() as u32;

    if line_count < 3 {
        return ComplexityScore {
            cyclomatic: 0.0,
            cognitive: 0.0,
            nesting_depth: 0,
            parameter_count,
            local_variable_count,
            line_count,
            readability: 1.0,
            testability: 1.0,
        };
    }

    let mut score: f32 = 1.0;
    score += count_word(body, "if") as f32;
    score += count_word_pair(body, "else", "if") as f32;

    // One `do` pulls exactly one paired `while` along with it; only count
    // a `while` as its own loop statement when it isn't that pairing.
    let for_count = count_word(body, "for");
    let do_count = count_word(body, "do");
    let standalone_while_count = count_word(body, "while").saturating_sub(do_count);
    score += 2.0 * (for_count + do_count + standalone_while_count) as f32;
    score += 2.0 * count_word(body, "switch") as f32;
    score += count_word(body, "try") as f32;
    score += count_word(body, "catch") as f32;
    score += 0.5
        * (count_word(body, "break")
            + count_word(body, "continue")
            + count_word(body, "return")
            + count_word(body, "goto")) as f32;
    score += 2.0
        * (count_word(body, "co_await") + count_word(body, "co_yield") + count_word(body, "co_return"))
            as f32;

    if line_count > 50 {
        score += 3.0;
    } else if line_count > 20 {
        score += 2.0;
    }
    if name.contains("process") || name.contains("analyze") {
        score += 1.0;
    }
    if name.starts_with("get") || name.starts_with("set") {
        score -= 1.0;
    }

    let nesting_depth = max_brace_nesting(body);
    let cognitive = score + nesting_depth as f32 * 0.5;

    let readability = (1.0 - (line_count as f32 / 200.0).min(1.0)).max(0.0);
    let testability = (1.0 - (score / 30.0).min(1.0)).max(0.0);

    ComplexityScore {
        cyclomatic: score.max(0.0).floor(),
        cognitive: cognitive.max(0.0),
        nesting_depth,
        parameter_count,
        local_variable_count,
        line_count,
        readability,
        testability,
    }
}

fn max_brace_nesting(body: &str) -> u32 {
    let mut depth: i32 = 0;
    let mut max_depth: i32 = 0;
    for c in body.chars() {
        match c {
            '{' => {
                depth += 1;
                max_depth = max_depth.max(depth);
            }
            '}' => depth -= 1,
            _ => {}
        }
    }
    max_depth.max(0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trivial_body_scores_zero() {
        let score = analyze("f", "return 1;", 0, 0);
        assert_eq!(score.gate_score(), 0);
    }

    #[test]
    fn three_ifs_one_for_one_switch_meets_seed_scenario_floor() {
        let body = r#"
            if (a) { x(); }
            if (b) { y(); }
            if (c) { z(); }
            for (int i = 0; i < 10; i++) { w(); }
            switch (v) { case 1: break; }
        "#;
        let score = analyze("f", body, 0, 0);
        assert!(score.cyclomatic >= 8.0, "got {}", score.cyclomatic);
        assert!(score.gate_score() >= 2);
    }

    #[test]
    fn if_else_counts_as_one_decision_point() {
        let body = "if (a) {\n    x();\n} else {\n    y();\n}\nz();";
        let score = analyze("f", body, 0, 0);
        // base 1.0 + one `if` = 2.0, bare `else` contributes nothing further
        assert_eq!(score.cyclomatic, 2.0);
    }

    #[test]
    fn do_while_counts_as_one_loop_statement() {
        let body = "do {\n    x();\n} while (cond);\nz();";
        let score = analyze("f", body, 0, 0);
        // base 1.0 + one loop statement (+2.0) = 3.0, not 5.0
        assert_eq!(score.cyclomatic, 3.0);
    }

    #[test]
    fn get_prefix_lowers_score_set_prefix_lowers_score() {
        let body = "if (a) { return x; } if (b) { return y; } if (c) { return z; }";
        let getter = analyze("getValue", body, 0, 0);
        let plain = analyze("computeValue", body, 0, 0);
        assert!(getter.cyclomatic <= plain.cyclomatic);
    }
}
