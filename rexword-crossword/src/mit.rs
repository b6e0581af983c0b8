use crate::puzzle::Puzzle;

fn lines(patterns: &[&str]) -> Vec<Vec<String>> {
    vec![patterns.iter().map(|&pattern| pattern.to_owned()).collect()]
}

/// The hexagonal regular crossword from the 2013 MIT Mystery Hunt.
///
/// <https://www.mit.edu/~puzzle/2013/coinheist.com/rubik/a_regular_crossword/grid.pdf>
pub fn mit_puzzle() -> Puzzle {
    Puzzle {
        id: "mit".to_owned(),
        name: "A Regular Crossword".to_owned(),
        size: 7,
        hexagonal: true,
        patterns_x: lines(&[
            r"(ND|ET|IN)[^X]*",
            r"[CHMNOR]*I[CHMNOR]*",
            r"P+(..)\1.*",
            r"(E|CR|MN)*",
            r"([^MC]|MM|CC)*",
            r"[AM]*CM(RC)*R?",
            r".*",
            r".*PRR.*DDC.*",
            r"(HHX|[^HX])*",
            r"([^EMC]|EM)*",
            r".*OXR.*",
            r".*LR.*RL.*",
            r".*SE.*UE.*",
        ]),
        patterns_y: lines(&[
            r".*H.*H.*",
            r"(DI|NS|TH|OM)*",
            r"F.*[AO].*[AO].*",
            r"(O|RHH|MM)*",
            r".*",
            r"C*MC(CCC|MM)*",
            r"[^C]*[^R]*III.*",
            r"(...?)\1*",
            r"([^X]|XCC)*",
            r"(RR|HHH)*.?",
            r"N.*X.X.X.*E",
            r"R*D*M*",
            r".(C|HH)*",
        ]),
        patterns_z: lines(&[
            r".*G.*V.*H.*",
            r"[CR]*",
            r".*XEXM*",
            r".*DD.*CCM.*",
            r".*XHCR.*X.*",
            r".*(.)(.)(.)(.)\4\3\2\1.*",
            r".*(IN|SE|HI)",
            r"[^C]*MMM[^C]*",
            r".*(.)C\1X\1.*",
            r"[CEIMU]*OH[AEMOR]*",
            r"(RX|[^R])*",
            r"[^M]*M[^M]*",
            r"(S|MM|HHH)*",
        ]),
        ..Puzzle::default()
    }
}
