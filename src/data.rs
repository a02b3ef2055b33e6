pub struct KnowledgePointSeed {
    pub id: &'static str,
    pub subject: &'static str,
    pub grade: i64,
    pub title: &'static str,
    pub chapter: &'static str,
    pub unit: &'static str,
}

pub struct QuestionSeed {
    pub id: &'static str,
    pub knowledge_point_id: &'static str,
    pub stem: &'static str,
    pub options: &'static [&'static str],
    pub answer: &'static str,
    pub explanation: &'static str,
    pub difficulty: &'static str,
}

pub const KNOWLEDGE_POINT_DATA: &[KnowledgePointSeed] = &[
    KnowledgePointSeed { id: "math-4-mul", subject: "math", grade: 4, title: "两位数乘法", chapter: "乘法", unit: "第一单元" },
    KnowledgePointSeed { id: "math-4-div", subject: "math", grade: 4, title: "除数是两位数的除法", chapter: "除法", unit: "第二单元" },
    KnowledgePointSeed { id: "math-4-angle", subject: "math", grade: 4, title: "角的度量", chapter: "几何", unit: "第三单元" },
    KnowledgePointSeed { id: "math-4-frac", subject: "math", grade: 4, title: "分数的意义", chapter: "分数", unit: "第四单元" },
    KnowledgePointSeed { id: "math-4-dec", subject: "math", grade: 4, title: "小数的加减法", chapter: "小数", unit: "第五单元" },
    KnowledgePointSeed { id: "math-4-area", subject: "math", grade: 4, title: "长方形的面积", chapter: "几何", unit: "第六单元" },
    KnowledgePointSeed { id: "english-4-past", subject: "english", grade: 4, title: "Simple past tense", chapter: "Grammar", unit: "Unit 1" },
    KnowledgePointSeed { id: "english-4-plural", subject: "english", grade: 4, title: "Plural nouns", chapter: "Grammar", unit: "Unit 2" },
];

pub const QUESTION_DATA: &[QuestionSeed] = &[
    QuestionSeed { id: "q-mul-1", knowledge_point_id: "math-4-mul", stem: "23 × 12 = ?", options: &["266", "276", "286", "246"], answer: "B", explanation: "23 × 10 = 230，23 × 2 = 46，230 + 46 = 276。", difficulty: "easy" },
    QuestionSeed { id: "q-mul-2", knowledge_point_id: "math-4-mul", stem: "45 × 21 = ?", options: &["945", "925", "955", "845"], answer: "A", explanation: "45 × 20 = 900，再加 45 得 945。", difficulty: "medium" },
    QuestionSeed { id: "q-mul-3", knowledge_point_id: "math-4-mul", stem: "38 × 25 = ?", options: &[], answer: "950", explanation: "38 × 100 ÷ 4 = 950。", difficulty: "hard" },
    QuestionSeed { id: "q-div-1", knowledge_point_id: "math-4-div", stem: "96 ÷ 12 = ?", options: &["6", "7", "8", "9"], answer: "C", explanation: "12 × 8 = 96。", difficulty: "easy" },
    QuestionSeed { id: "q-div-2", knowledge_point_id: "math-4-div", stem: "420 ÷ 35 = ?", options: &[], answer: "12", explanation: "35 × 12 = 420。", difficulty: "medium" },
    QuestionSeed { id: "q-div-3", knowledge_point_id: "math-4-div", stem: "175 ÷ 25 = ?", options: &["5", "6", "7", "8"], answer: "C", explanation: "25 × 7 = 175。", difficulty: "easy" },
    QuestionSeed { id: "q-angle-1", knowledge_point_id: "math-4-angle", stem: "直角等于多少度？", options: &["45°", "90°", "180°", "360°"], answer: "B", explanation: "直角是 90°。", difficulty: "easy" },
    QuestionSeed { id: "q-angle-2", knowledge_point_id: "math-4-angle", stem: "平角等于多少度？", options: &["90°", "120°", "180°", "360°"], answer: "C", explanation: "平角是 180°。", difficulty: "easy" },
    QuestionSeed { id: "q-angle-3", knowledge_point_id: "math-4-angle", stem: "钟面上 3 点整，时针和分针的夹角是多少度？", options: &[], answer: "90", explanation: "相邻两个数字之间是 30°，3 格就是 90°。", difficulty: "medium" },
    QuestionSeed { id: "q-frac-1", knowledge_point_id: "math-4-frac", stem: "把一个蛋糕平均分成 8 份，取 3 份，是这个蛋糕的几分之几？", options: &["3/5", "3/8", "5/8", "8/3"], answer: "B", explanation: "分母表示平均分的份数，分子表示取的份数。", difficulty: "easy" },
    QuestionSeed { id: "q-frac-2", knowledge_point_id: "math-4-frac", stem: "2/4 和下面哪个分数相等？", options: &["1/2", "2/3", "3/4", "1/4"], answer: "A", explanation: "分子分母同时除以 2。", difficulty: "medium" },
    QuestionSeed { id: "q-frac-3", knowledge_point_id: "math-4-frac", stem: "1/3 和 1/4 哪个大？", options: &["1/3", "1/4"], answer: "A", explanation: "分子相同，分母越小分数越大。", difficulty: "easy" },
    QuestionSeed { id: "q-dec-1", knowledge_point_id: "math-4-dec", stem: "0.5 + 0.25 = ?", options: &[], answer: "0.75", explanation: "小数点对齐再相加。", difficulty: "easy" },
    QuestionSeed { id: "q-dec-2", knowledge_point_id: "math-4-dec", stem: "3.2 - 1.45 = ?", options: &["1.75", "1.85", "2.25", "1.65"], answer: "A", explanation: "3.20 - 1.45 = 1.75。", difficulty: "medium" },
    QuestionSeed { id: "q-area-1", knowledge_point_id: "math-4-area", stem: "长 6 厘米、宽 4 厘米的长方形面积是多少平方厘米？", options: &[], answer: "24", explanation: "长方形面积 = 长 × 宽。", difficulty: "easy" },
    QuestionSeed { id: "q-area-2", knowledge_point_id: "math-4-area", stem: "边长 5 米的正方形面积是多少平方米？", options: &["20", "25", "10", "15"], answer: "B", explanation: "正方形面积 = 边长 × 边长。", difficulty: "easy" },
    QuestionSeed { id: "q-past-1", knowledge_point_id: "english-4-past", stem: "Yesterday I ___ to the park.", options: &["go", "went", "goes", "going"], answer: "B", explanation: "go 的过去式是 went。", difficulty: "easy" },
    QuestionSeed { id: "q-past-2", knowledge_point_id: "english-4-past", stem: "She ___ her homework last night.", options: &["do", "does", "did", "doing"], answer: "C", explanation: "last night 提示用一般过去时。", difficulty: "easy" },
    QuestionSeed { id: "q-plural-1", knowledge_point_id: "english-4-plural", stem: "What is the plural of \"child\"?", options: &[], answer: "children", explanation: "child 是不规则变化。", difficulty: "medium" },
    QuestionSeed { id: "q-plural-2", knowledge_point_id: "english-4-plural", stem: "What is the plural of \"box\"?", options: &["boxs", "boxes", "boxies", "box"], answer: "B", explanation: "以 x 结尾的名词加 es。", difficulty: "easy" },
];
