//! Shared constants for noticeboard.
//!
//! Centralizes the fixed vocabularies and bounds that the schemas, the index
//! builder and the search side all agree on.

/// Field stamped once when a record is created.
pub const CREATED_AT_FIELD: &str = "created_at";

/// Field stamped on every accepted update.
pub const UPDATED_AT_FIELD: &str = "updated_at";

/// Unique, normalized account email on `user` records.
pub const EMAIL_FIELD: &str = "email";

/// Constraint id reported when a required field is absent or null.
pub const REQUIRED_CONSTRAINT: &str = "required";

/// Constraint id reported when a value has the wrong structural type.
pub const TYPE_MISMATCH_CONSTRAINT: &str = "type_mismatch";

/// Constraint id reported by the service when a normalized email is already taken.
pub const EMAIL_UNIQUE_CONSTRAINT: &str = "email_unique";

/// Sentinel every tag-like array element must start with.
pub const TAG_PREFIX: char = '#';

/// Top-level notice categories. Also the vocabulary `category_ai` is drawn from.
pub const MAIN_CATEGORIES: &[&str] =
    &["#학사", "#장학", "#취업", "#행사", "#공모전/대회", "#국제교류", "#일반"];

/// Interest keywords a user profile may select: main categories plus every
/// sub-category. `#기타` appears under several categories and is listed once.
pub const ALLOWED_KEYWORDS: &[&str] = &[
    // main categories
    "#학사",
    "#장학",
    "#취업",
    "#행사",
    "#공모전/대회",
    "#국제교류",
    "#일반",
    // 학사
    "#소속변경",
    "#ABEEK",
    "#신입생",
    "#S/U",
    "#교직과정",
    "#휴학",
    "#복학",
    "#수강신청",
    "#졸업",
    "#등록금",
    "#교과목",
    "#전공과목",
    "#다전공",
    "#기타",
    // 장학
    "#가계곤란",
    "#국가장학",
    "#근로장학",
    "#성적우수",
    "#생활비",
    // 취업
    "#채용",
    "#인턴십",
    "#현장실습",
    "#강사",
    "#조교",
    "#채용설명회",
    "#취업특강",
    "#창업",
    // 행사
    "#특강",
    "#워크숍",
    "#세미나",
    "#설명회",
    "#포럼",
    "#지원",
    "#교육",
    "#프로그램",
    // 공모전/대회
    "#공모전",
    "#경진대회",
    "#디자인",
    "#숏폼",
    "#영상",
    "#아이디어",
    "#논문",
    "#학생설계전공",
    "#마이크로전공",
    // 국제교류
    "#교환학생",
    "#파견",
    "#campusasia",
    "#글로벌",
    "#단기",
    "#하계",
    "#동계",
    "#어학연수",
    "#해외봉사",
    "#일본",
    "#미국",
];

pub const GENDERS: &[&str] = &["male", "female", "prefer_not_to_say"];

pub const MILITARY_SERVICE_STATUSES: &[&str] = &["completed", "pending", "exempt", "n/a"];

/// College key to the synonym phrase appended to a notice's search document.
/// Keys match the crawler's college registry; anything else expands to nothing.
pub const COLLEGE_SYNONYMS: &[(&str, &str)] = &[
    ("main", "메인 본교 전체 공지"),
    ("liberal", "문과 문과대학 인문"),
    ("business", "상경 상경대학 경제"),
    ("management", "경영 경영대학 경영학"),
    ("engineering", "공과 공과대학 공학 공대"),
    ("life", "생명 생명시스템 생시대"),
    ("ai", "인공지능 인공지능융합 AI 인융대"),
    ("theology", "신과 신과대학 신학"),
    ("social", "사회과학 사회과학대학 사과대"),
    ("music", "음악 음악대학 음대"),
    ("human", "생활과학 생활과학대학 생과대"),
    ("education", "교육과학 교육과학대학 교과대"),
    ("underwood", "언더우드 언더우드국제대학 UIC"),
    ("global", "글로벌인재 글로벌인재대학 글인대"),
    ("medicine", "의과 의과대학 의학 의대"),
    ("dentistry", "치과 치과대학 치의학 치대"),
    ("nursing", "간호 간호대학 간호학 간호대"),
    ("pharmacy", "약학 약학대학 약대"),
];

/// Inclusive TOEIC score bounds.
pub const TOEIC_MIN: u64 = 0;
pub const TOEIC_MAX: u64 = 990;

/// Maximum stored length of a normalized email address.
pub const EMAIL_MAX_CHARS: usize = 255;

/// Maximum notice title length.
pub const TITLE_MAX_CHARS: usize = 500;

/// Maximum college key length.
pub const COLLEGE_KEY_MAX_CHARS: usize = 100;

/// Looks up the synonym phrase for a college key. Unknown keys yield `None`.
#[must_use]
pub fn college_synonyms(college_key: &str) -> Option<&'static str> {
    COLLEGE_SYNONYMS.iter().find(|(key, _)| *key == college_key).map(|(_, phrase)| *phrase)
}
